mod commands;

pub use commands::{
    decode_keys, encode_key, render, resolve_key, unresolve_key, KeyReport, OutputFormat,
};
