//! OS signal handling.
//!
//! Ctrl-C / SIGINT is the only control input besides the connection. It is
//! translated into a [`Shutdown`] trigger.

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Trigger `shutdown` when the process receives an interrupt.
///
/// If the handler cannot be installed the error is logged and the session
/// can only end through the connection.
pub fn spawn_interrupt_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for interrupt signal");
                // Keep subscribers from seeing a closed channel as an interrupt.
                std::future::pending::<()>().await;
            }
        }
    })
}
