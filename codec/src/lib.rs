// Entasis codec - deterministic CBOR sizing for draft transactions

pub mod tx;

pub use self::tx::{
    encode_draft_body, encode_script_witnesses, encoded_output_size, encoded_tx_size,
    VKEY_WITNESS_SIZE,
};
