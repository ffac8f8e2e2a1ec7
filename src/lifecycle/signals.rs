//! OS signal handling.
//!
//! SIGTERM and SIGINT stop the host, SIGHUP asks for a config reload.

/// What a received signal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Terminate,
    Reload,
}

/// Wait for the next signal of interest.
#[cfg(unix)]
pub async fn next_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut hup = signal(SignalKind::hangup())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| Signal::Terminate),
        _ = term.recv() => Ok(Signal::Terminate),
        _ = hup.recv() => Ok(Signal::Reload),
    }
}

/// Wait for the next signal of interest.
#[cfg(not(unix))]
pub async fn next_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await.map(|_| Signal::Terminate)
}
