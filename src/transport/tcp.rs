use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::Link;

/// Bind a listening socket for a hosted match.
pub async fn bind<A: ToSocketAddrs>(addr: A) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    log::info!("listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Wait for one peer on `listener`.
pub async fn accept(
    listener: &TcpListener,
    timeout_duration: Duration,
) -> anyhow::Result<(Link, SocketAddr)> {
    let (stream, addr) = timeout(timeout_duration, listener.accept())
        .await
        .map_err(|_| anyhow::anyhow!("no peer connected within {:?}", timeout_duration))?
        .context("accept failed")?;
    log::info!("peer connected from {}", addr);
    Ok((link(stream, timeout_duration)?, addr))
}

/// Host on `port` on every interface and wait for one peer.
pub async fn listen(port: u16, timeout_duration: Duration) -> anyhow::Result<(Link, SocketAddr)> {
    let listener = bind(("0.0.0.0", port)).await?;
    accept(&listener, timeout_duration).await
}

/// Connect to a hosted match.
pub async fn connect<A: ToSocketAddrs>(addr: A, timeout_duration: Duration) -> anyhow::Result<Link> {
    let stream = timeout(timeout_duration, TcpStream::connect(addr))
        .await
        .map_err(|_| anyhow::anyhow!("connect timeout after {:?}", timeout_duration))?
        .context("connect failed")?;
    log::info!("connected to {}", stream.peer_addr()?);
    link(stream, timeout_duration)
}

fn link(stream: TcpStream, timeout_duration: Duration) -> anyhow::Result<Link> {
    stream.set_nodelay(true)?;
    Ok(Link::from_stream(stream, timeout_duration))
}
