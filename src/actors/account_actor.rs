use std::sync::Arc;

use tokio::spawn;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::engine::Command;
use crate::ledger::BalanceLedger;
use crate::models::TicketingError;
use crate::session::{Session, SessionHub};
use crate::storage::DocumentStore;

/// Applies one user's commands strictly in arrival order, signed in under a
/// session of its own for as long as it runs.
pub struct AccountActor {
    sender: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>
}

impl AccountActor {
    pub fn new<S: DocumentStore>(user_id: &str, ledger: Arc<BalanceLedger<S>>, sessions: Arc<SessionHub>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Command>();
        let session = sessions.sign_in(user_id);

        let handle = spawn(async move {
            while let Some(command) = receiver.recv().await {
                match apply(&ledger, &session, command).await {
                    Ok(outcome) => {
                        debug!("Command for user [{}] processed: {outcome}", session.user_id());
                    },
                    Err(error) => {
                        //NOTE: Rejections are terminal for the command only, the actor keeps serving the user
                        warn!("{error}");
                    }
                }
            }

            sessions.sign_out(session);
        });

        Self { sender, handle }
    }

    /// Queues a command. Returns `false` if the actor has already stopped.
    pub fn accept(&self, command: Command) -> bool {
        self.sender.send(command).is_ok()
    }

    /// Closes the queue and waits for every queued command to be applied.
    pub async fn despawn(self) -> Result<(), JoinError> {
        drop(self.sender);
        self.handle.await
    }
}

async fn apply<S: DocumentStore>(ledger: &BalanceLedger<S>, session: &Session, command: Command) -> Result<String, TicketingError> {
    match command {
        Command::Register(registration) => {
            let account = ledger.register(registration).await?;
            Ok(format!("registered with balance [{}]", account.balance))
        }
        Command::Recharge { amount, .. } => {
            let balance = ledger.recharge(session, amount).await?;
            Ok(format!("recharged [{amount}], balance [{balance}]"))
        }
        Command::Purchase { request, .. } => {
            let receipt = ledger.purchase_ticket(session, &request).await?;
            Ok(format!("ticket [{}] for [{}], balance [{}]", receipt.ticket_id, receipt.ticket.fare_charged, receipt.balance))
        }
    }
}
