//! # `sexpkit` main library
//!
//! This library parses, navigates, and re-serializes the Lisp-style
//! S-expressions used as the interchange format for cryptographic key
//! material and signed messages (Rivest's canonical S-expressions).
//!
//! ## Architecture
//!
//! A parsed expression is a `tree::Sexp`: one owned byte sequence holding a
//! tagged, depth-first linearization of the whole structure.  Everything is
//! built around that flat form:
//! * `parse` scans surface text (any mix of the accepted atom encodings)
//!   into a tree; `parse_template` also substitutes `%m`/`%s`/`%d` runtime
//!   arguments
//! * navigator methods (`length`, `nth`, `car`, `cdr`, `find_token`, ...)
//!   walk the stream and extract fresh sub-trees or typed atoms
//! * the serializer re-emits canonical or advanced wire text
//!
//! Empty input and the empty list both normalize to the absent tree, which
//! this API spells `None`.
//!
//! ## Sensitive material
//!
//! Trees that receive a secure big integer through `%m` move their backing
//! storage to the sensitive memory class: locked against swap where the
//! platform allows and wiped on release.  Sensitivity propagates from atom
//! to tree, never the reverse; sub-trees extracted by the navigator are
//! ordinary.
//!
//! ## Example
//!
//! ```
//! use sexpkit::{parse,Format};
//!
//! let key = parse(b"(public-key (rsa (n #00C0FFEE#) (e 3:257)))").unwrap().unwrap();
//! let rsa = key.find_token(b"rsa").unwrap();
//! assert_eq!(rsa.nth_data(0),Some(&b"rsa"[..]));
//! let n = key.find_token(b"n").unwrap();
//! assert_eq!(n.encode(Format::Canonical),b"(1:n4:\x00\xc0\xff\xee)");
//! ```

pub mod mem;
pub mod encoding;
pub mod tree;
pub mod parse;
pub mod nav;
pub mod print;
pub mod mpi;

pub use tree::{Sexp,dump_string};
pub use parse::{parse,parse_template,Arg,SyntaxError};
pub use print::{Format,sprint,encode};
pub use mpi::{Mpi,MpiFormat,MpiError};
