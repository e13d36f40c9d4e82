use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ReadFareTable,
    ReadAccount,
    CreateAccount,
    WriteAccount,
    AppendTicket,
    ListTickets
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store did not complete [{operation:?}] in time")]
    Unavailable {
        operation: StoreOperation
    },
    #[error("Document [{key}] is no longer at version [{expected}]")]
    Conflict {
        key: String,
        expected: u64
    },
    #[error("Document [{key}] already exists")]
    AlreadyExists {
        key: String
    },
    #[error("Document [{key}] does not exist")]
    NotFound {
        key: String
    }
}
