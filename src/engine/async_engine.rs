use crate::actors::AccountActor;
use crate::engine::{Command, CommandRow};
use crate::ledger::BalanceLedger;
use crate::session::SessionHub;
use crate::storage::DocumentStore;
use crate::types::UserId;
use csv::{ReaderBuilder, Trim};
use futures::future::join_all;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::error;

/// Replays a CSV command journal against the ledger, one actor per user.
pub struct AsyncEngine<S: DocumentStore> {
    ledger: Arc<BalanceLedger<S>>,
    sessions: Arc<SessionHub>,
    backpressure: usize
}

impl<S: DocumentStore> AsyncEngine<S> {
    pub fn new(ledger: Arc<BalanceLedger<S>>, sessions: Arc<SessionHub>) -> Self {
        Self {
            ledger,
            sessions,
            backpressure: 256
        }
    }

    /// Bounds how many parsed commands may wait for dispatch.
    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    /// Replays every register, recharge and purchase row in `path`.
    ///
    /// Rows that do not parse into a command are logged and skipped. Commands
    /// for one rider are applied in journal order by that rider's actor, and
    /// the call returns once every actor has drained its queue.
    pub async fn run(&self, path: &str) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel::<Command>(self.backpressure);
        let csv_handle = self.spawn_csv_reader(path.to_string(), sender);
        let processing_result = self.process_commands(receiver).await;

        if let Err(error) = csv_handle.await {
            error!("CSV ingestion failed: {error}");
        }

        processing_result
    }

    /// Parses journal rows on a blocking thread and hands ticketing commands
    /// to the dispatcher, waiting whenever the channel is full.
    fn spawn_csv_reader(&self, path: String, sender: mpsc::Sender<Command>) -> JoinHandle<()> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening CSV at path: {path} | {error}");
                    return;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            for result in reader.deserialize::<CommandRow>() {
                let command = match result {
                    Ok(row) => Command::try_from(row),
                    Err(error) => {
                        error!("CSV deserialization error: {error}");
                        continue;
                    }
                };

                match command {
                    Ok(command) => {
                        if sender.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        error!("Skipping command: {error}");
                    }
                }
            }
        })
    }

    /// Routes each command to the actor of the rider it names, starting one
    /// (and signing the rider in) on the rider's first command.
    async fn process_commands(&self, mut receiver: mpsc::Receiver<Command>) -> anyhow::Result<()> {
        let mut actors = HashMap::<UserId, AccountActor>::new();

        while let Some(command) = receiver.recv().await {
            let user_id = command.user_id().to_string();
            let actor = actors.entry(user_id.clone()).or_insert_with(|| {
                AccountActor::new(&user_id, self.ledger.clone(), self.sessions.clone())
            });

            if !actor.accept(command) {
                error!("Account actor for user [{user_id}] could not accept a command");
            }
        }

        //NOTE: Wait for every actor to drain its queue before reporting completion
        let despawns = actors.into_values().map(|actor| actor.despawn());

        for result in join_all(despawns).await {
            if let Err(error) = result {
                error!("An account actor did not despawn gracefully: {error:?}");
            }
        }

        Ok(())
    }
}
