// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use crate::api::ApiHandler;
use crate::handler::BaseHandler;
use std::net::SocketAddr;

/// HTTP connection manager using Axum.
#[derive(Clone)]
pub struct HttpConnectionManager {
    handler: ApiHandler,
}

impl HttpConnectionManager {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: ApiHandler::new(handler),
        }
    }

    pub async fn serve(
        &self,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("Starting HTTP server on {}", addr);
        let app = self.handler.clone().router();

        // Bind TCP listener with tuned settings
        use socket2::{Domain, Protocol, Socket, Type};

        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        // Disable Nagle's algorithm (reduces latency)
        socket.set_nodelay(true)?;
        socket.set_reuse_address(true)?;

        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        // Tokio requires the fd in non-blocking mode
        socket.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(socket.into())?;

        axum::serve(listener, app).await?;
        Ok(())
    }
}
