//! # Scanner Module
//!
//! Single-pass scanner from surface text to the internal tag stream.  Four
//! atom encodings are accepted: bare tokens, length-prefixed raw bytes
//! (`3:abc`), quoted strings with escapes, and hex or base64 between `#` or
//! `|` delimiters.  Display hints (`[...]`) are recognized and discarded.
//!
//! `parse_template` additionally accepts `%m`, `%s`, and `%d` directives,
//! consuming a tagged argument stream left to right.  Inserting a sensitive
//! big integer moves the whole tree into the sensitive memory class.
//!
//! Errors carry the byte offset of the offending input byte and map onto a
//! set of stable integer codes that long predate this crate; callers match
//! on those codes and they will not change.

use log::debug;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use crate::encoding;
use crate::tree::{self,TreeBuilder,Sexp};
use crate::mpi::{Mpi,MpiFormat};

/// Enumerates scan errors.  The `Display` trait prints the long message;
/// `code` and `offset` recover the stable numeric contract.
#[derive(thiserror::Error,Debug,PartialEq,Eq,Clone,Copy)]
pub enum SyntaxError {
    #[error("invalid character at offset {0}")]
    InvalidChar(usize),
    #[error("data runs past the end of input at offset {0}")]
    StringTooLong(usize),
    #[error("unrecognized or unsupported byte at offset {0}")]
    BadCharacter(usize),
    #[error("invalid escape in quoted string at offset {0}")]
    BadQuotation(usize),
    #[error("length prefix begins with zero at offset {0}")]
    ZeroPrefix(usize),
    #[error("nested display hint at offset {0}")]
    NestedDisplayHint(usize),
    #[error("unmatched display hint at offset {0}")]
    UnmatchedDisplayHint(usize),
    #[error("reserved punctuation at offset {0}")]
    UnexpectedPunctuation(usize),
    #[error("invalid hex character at offset {0}")]
    BadHexCharacter(usize),
    #[error("odd number of hex digits at offset {0}")]
    OddHexDigits(usize)
}

impl SyntaxError {
    /// The stable integer code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidChar(_) => -1,
            Self::StringTooLong(_) => -2,
            Self::BadCharacter(_) => -5,
            Self::BadQuotation(_) => -6,
            Self::ZeroPrefix(_) => -7,
            Self::NestedDisplayHint(_) => -8,
            Self::UnmatchedDisplayHint(_) => -9,
            Self::UnexpectedPunctuation(_) => -10,
            Self::BadHexCharacter(_) => -11,
            Self::OddHexDigits(_) => -12
        }
    }
    /// Byte offset into the scanned input where the offending byte sits.
    /// For a construct left dangling at end of input this is where the
    /// construct began.
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidChar(n) | Self::StringTooLong(n) | Self::BadCharacter(n) |
            Self::BadQuotation(n) | Self::ZeroPrefix(n) | Self::NestedDisplayHint(n) |
            Self::UnmatchedDisplayHint(n) | Self::UnexpectedPunctuation(n) |
            Self::BadHexCharacter(n) | Self::OddHexDigits(n) => *n
        }
    }
}

/// One runtime argument for `parse_template`.  Arguments are consumed in
/// the order the `%` directives appear: `%m` takes `Mpi`, `%s` takes `Str`,
/// `%d` takes `Int`.
pub enum Arg<'a> {
    Mpi(&'a Mpi),
    Str(&'a str),
    Int(i32)
}

/// Scan a buffer and return the tree, or `None` for empty input and the
/// empty list.  `%` has no special meaning here.
pub fn parse(buffer: &[u8]) -> Result<Option<Sexp>,SyntaxError> {
    scan(buffer,None)
}

/// Scan a template and substitute one argument for each `%` directive,
/// left to right.  A sensitive `%m` argument makes the whole tree
/// sensitive.
pub fn parse_template(buffer: &[u8],args: &[Arg]) -> Result<Option<Sexp>,SyntaxError> {
    scan(buffer,Some(args))
}

fn scan(buffer: &[u8],args: Option<&[Arg]>) -> Result<Option<Sexp>,SyntaxError> {
    let result = scan_inner(buffer,args);
    if let Err(e) = &result {
        debug!("scan failed: {}",e);
    }
    result
}

fn scan_inner(buffer: &[u8],args: Option<&[Arg]>) -> Result<Option<Sexp>,SyntaxError> {
    // the internal form never outgrows the surface form
    let mut bld = TreeBuilder::new(buffer.len());

    // at most one of these position markers is live at a time; each records
    // where its construct began, both for content extraction and for the
    // error offset if the construct dangles at end of input
    let mut token_start: Option<usize> = None;
    let mut quote_start: Option<usize> = None;
    let mut quoted_esc = false;
    let mut quote_buf: Vec<u8> = Vec::new();
    let mut hex_start: Option<usize> = None;
    let mut hex_digits: Vec<u8> = Vec::new();
    let mut b64_start: Option<usize> = None;
    let mut b64_body: Vec<u8> = Vec::new();
    let mut length_start: Option<usize> = None;
    let mut length_val: usize = 0;
    let mut percent_start: Option<usize> = None;
    let mut hint_start: Option<usize> = None;
    let mut next_arg: usize = 0;

    let mut i = 0;
    while i < buffer.len() {
        let b = buffer[i];
        // a running token ends at the first non-token byte, which then falls
        // through to the dispatch below in the same pass
        if let Some(start) = token_start {
            if encoding::is_token_char(b) {
                i += 1;
                continue;
            }
            bld.put_data(&buffer[start..i]).map_err(|_| SyntaxError::StringTooLong(start))?;
            token_start = None;
        }
        if let Some(start) = quote_start {
            if quoted_esc {
                quoted_esc = false;
                if let Some(esc) = encoding::simple_escape(b) {
                    quote_buf.push(esc);
                    i += 1;
                    continue;
                }
                match b {
                    b'0'..=b'7' => {
                        // three octal digits form one byte
                        if !(i+2 < buffer.len() && encoding::is_octal_digit(buffer[i+1]) && encoding::is_octal_digit(buffer[i+2])) {
                            return Err(SyntaxError::BadQuotation(i));
                        }
                        quote_buf.push(encoding::octal_triple(b,buffer[i+1],buffer[i+2]));
                        i += 2;
                    },
                    b'x' => {
                        if !(i+2 < buffer.len() && buffer[i+1].is_ascii_hexdigit() && buffer[i+2].is_ascii_hexdigit()) {
                            return Err(SyntaxError::BadQuotation(i));
                        }
                        quote_buf.push(encoding::hex_pair(buffer[i+1],buffer[i+2]));
                        i += 2;
                    },
                    b'\r' => {
                        // line continuation, CR optionally followed by LF
                        if i+1 < buffer.len() && buffer[i+1]==b'\n' {
                            i += 1;
                        }
                    },
                    b'\n' => {
                        if i+1 < buffer.len() && buffer[i+1]==b'\r' {
                            i += 1;
                        }
                    },
                    _ => return Err(SyntaxError::BadQuotation(i))
                }
            } else if b==b'\\' {
                quoted_esc = true;
            } else if b==b'"' {
                bld.put_data(&quote_buf).map_err(|_| SyntaxError::StringTooLong(start))?;
                quote_buf.clear();
                quote_start = None;
            } else {
                quote_buf.push(b);
            }
            i += 1;
            continue;
        }
        if let Some(start) = hex_start {
            if b.is_ascii_hexdigit() {
                hex_digits.push(b);
            } else if b==b'#' {
                if hex_digits.len() % 2 == 1 {
                    return Err(SyntaxError::OddHexDigits(i));
                }
                let bytes = hex::decode(&hex_digits).expect("unreachable");
                bld.put_data(&bytes).map_err(|_| SyntaxError::StringTooLong(start))?;
                hex_digits.clear();
                hex_start = None;
            } else if !b.is_ascii_whitespace() {
                return Err(SyntaxError::BadHexCharacter(i));
            }
            i += 1;
            continue;
        }
        if let Some(start) = b64_start {
            if b==b'|' {
                match BASE64.decode(&b64_body) {
                    Ok(bytes) => bld.put_data(&bytes).map_err(|_| SyntaxError::StringTooLong(start))?,
                    Err(_) => return Err(SyntaxError::BadCharacter(start))
                };
                b64_body.clear();
                b64_start = None;
            } else if b.is_ascii_alphanumeric() || b==b'+' || b==b'/' || b==b'=' {
                b64_body.push(b);
            } else if !b.is_ascii_whitespace() {
                return Err(SyntaxError::BadCharacter(i));
            }
            i += 1;
            continue;
        }
        if length_start.is_some() {
            if b.is_ascii_digit() {
                length_val = length_val.saturating_mul(10).saturating_add((b-b'0') as usize);
            } else if b==b':' {
                length_start = None;
                if length_val > buffer.len()-i-1 || length_val > tree::MAX_ATOM {
                    return Err(SyntaxError::StringTooLong(i));
                }
                bld.put_data(&buffer[i+1..i+1+length_val]).map_err(|_| SyntaxError::StringTooLong(i))?;
                i += length_val;
                length_val = 0;
            } else if b==b'"' {
                // the length prefix is optional before a delimited form
                length_start = None;
                length_val = 0;
                quote_start = Some(i);
                quoted_esc = false;
            } else if b==b'#' {
                length_start = None;
                length_val = 0;
                hex_start = Some(i);
                hex_digits.clear();
            } else if b==b'|' {
                length_start = None;
                length_val = 0;
                b64_start = Some(i);
                b64_body.clear();
            } else {
                return Err(SyntaxError::InvalidChar(i));
            }
            i += 1;
            continue;
        }
        if percent_start.is_some() {
            percent_start = None;
            let supplied = args.expect("unreachable");
            match b {
                b'm' => {
                    let m = match supplied.get(next_arg) {
                        Some(Arg::Mpi(m)) => *m,
                        _ => return Err(SyntaxError::InvalidChar(i))
                    };
                    next_arg += 1;
                    if m.is_secure() {
                        bld.upgrade_to_sensitive();
                    }
                    bld.put_data(&m.print(MpiFormat::Std)).map_err(|_| SyntaxError::StringTooLong(i))?;
                },
                b's' => {
                    let s = match supplied.get(next_arg) {
                        Some(Arg::Str(s)) => *s,
                        _ => return Err(SyntaxError::InvalidChar(i))
                    };
                    next_arg += 1;
                    bld.put_data(s.as_bytes()).map_err(|_| SyntaxError::StringTooLong(i))?;
                },
                b'd' => {
                    let v = match supplied.get(next_arg) {
                        Some(Arg::Int(v)) => *v,
                        _ => return Err(SyntaxError::InvalidChar(i))
                    };
                    next_arg += 1;
                    bld.put_data(format!("{}",v).as_bytes()).map_err(|_| SyntaxError::StringTooLong(i))?;
                },
                _ => return Err(SyntaxError::InvalidChar(i))
            }
            i += 1;
            continue;
        }
        if hint_start.is_some() {
            match b {
                b']' => {
                    hint_start = None;
                },
                b'[' => return Err(SyntaxError::NestedDisplayHint(i)),
                b'(' | b')' => return Err(SyntaxError::UnmatchedDisplayHint(i)),
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'(' => bld.put_open(),
            b')' => bld.put_close(),
            b'"' => {
                quote_start = Some(i);
                quoted_esc = false;
            },
            b'#' => {
                hex_start = Some(i);
                hex_digits.clear();
            },
            b'|' => {
                b64_start = Some(i);
                b64_body.clear();
            },
            b'[' => hint_start = Some(i),
            b']' => return Err(SyntaxError::UnmatchedDisplayHint(i)),
            b'0' => return Err(SyntaxError::ZeroPrefix(i)),
            b'1'..=b'9' => {
                length_start = Some(i);
                length_val = (b-b'0') as usize;
            },
            b'{' => return Err(SyntaxError::UnexpectedPunctuation(i)),
            b'&' | b'\\' => return Err(SyntaxError::UnexpectedPunctuation(i)),
            b'%' if args.is_some() => percent_start = Some(i),
            _ if encoding::is_token_char(b) => token_start = Some(i),
            _ if b.is_ascii_whitespace() => {},
            _ => return Err(SyntaxError::BadCharacter(i))
        }
        i += 1;
    }

    // a trailing token completes naturally; every delimited construct that
    // is still open at end of input is an error at its starting byte
    if let Some(start) = token_start {
        bld.put_data(&buffer[start..]).map_err(|_| SyntaxError::StringTooLong(start))?;
    }
    if let Some(start) = quote_start {
        return Err(SyntaxError::BadQuotation(start));
    }
    if let Some(start) = hex_start {
        return Err(SyntaxError::OddHexDigits(start));
    }
    if let Some(start) = b64_start {
        return Err(SyntaxError::BadCharacter(start));
    }
    if let Some(start) = length_start {
        return Err(SyntaxError::StringTooLong(start));
    }
    if let Some(start) = percent_start {
        return Err(SyntaxError::InvalidChar(start));
    }
    if let Some(start) = hint_start {
        return Err(SyntaxError::UnmatchedDisplayHint(start));
    }
    bld.put_stop();
    Ok(bld.finish())
}
