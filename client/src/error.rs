use split_escrow_core::{EscrowError, TransferError};

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),
    #[error("Token error: {0}")]
    Token(#[from] TransferError),
}
