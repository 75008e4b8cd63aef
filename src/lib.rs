// Copyright (c) 2020, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

//! AES Key Wrap (RFC 3394) and AES Key Wrap with Padding (RFC 5649).
//!
//! [`AesKeyWrap`] fixes the KEK size and exposes `wrap`, `unwrap`,
//! `wrap_pad` and `unwrap_pad`. The rounds run on any [`BlockPrimitive`];
//! [`AesEcb`] is the default.

#[cfg(test)]
#[macro_use]
extern crate hex_literal;

mod types;

mod cipher;
mod error;
mod keywrap;
mod padding;
mod unwrap;
mod wrap;
pub use cipher::{AesEcb, Block, BlockPrimitive};
pub use error::{KeyWrapError, KeyWrapResult};
pub use keywrap::AesKeyWrap;
pub use types::{KekSize, AES_BLOCK_LEN, AIV_PREFIX, BLOCK_LEN, DEFAULT_IV};
