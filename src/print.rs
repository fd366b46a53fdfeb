//! # Serializer Module
//!
//! Re-emit a tree in wire form.  Canonical mode is the unambiguous
//! interchange encoding: parens for lists, `<length>:<bytes>` for atoms,
//! nothing else.  Advanced mode is the same with a newline after every
//! closing paren, which is enough to make key material legible.
//!
//! The buffer contract is the historical one: with a buffer, the return is
//! the number of bytes written, or 0 if the buffer cannot also hold one
//! trailing NUL written for caller convenience; with no buffer, the return
//! is the required size including that NUL.

use crate::tree::{Sexp,get_len,STOP,DATA,OPEN,CLOSE,LEN_SIZE};

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum Format {
    Canonical,
    Advanced
}

// the absent tree serializes as the empty list
const EMPTY: [u8;3] = [OPEN,CLOSE,STOP];

/// Serialize `list` into `buffer`, or measure the required size when no
/// buffer is given.
pub fn sprint(list: Option<&Sexp>,mode: Format,mut buffer: Option<&mut [u8]>) -> usize {
    let s: &[u8] = match list {
        Some(sexp) => sexp.stream(),
        None => &EMPTY
    };
    let mut len = 0;
    let mut d = 0;
    let mut p = 0;
    while s[p] != STOP {
        match s[p] {
            OPEN => {
                p += 1;
                len += 1;
                if let Some(buf) = buffer.as_deref_mut() {
                    if len >= buf.len() {
                        return 0;
                    }
                    buf[d] = b'(';
                    d += 1;
                }
            },
            CLOSE => {
                p += 1;
                len += 1;
                if mode != Format::Canonical {
                    len += 1;
                }
                if let Some(buf) = buffer.as_deref_mut() {
                    if len >= buf.len() {
                        return 0;
                    }
                    buf[d] = b')';
                    d += 1;
                    if mode != Format::Canonical {
                        buf[d] = b'\n';
                        d += 1;
                    }
                }
            },
            DATA => {
                p += 1;
                let n = get_len(s,p);
                p += LEN_SIZE;
                let prefix = format!("{}:",n);
                len += prefix.len() + n;
                if let Some(buf) = buffer.as_deref_mut() {
                    if len >= buf.len() {
                        return 0;
                    }
                    buf[d..d+prefix.len()].copy_from_slice(prefix.as_bytes());
                    d += prefix.len();
                    buf[d..d+n].copy_from_slice(&s[p..p+n]);
                    d += n;
                }
                p += n;
            },
            _ => panic!("corrupt expression stream")
        }
    }
    if let Some(buf) = buffer.as_deref_mut() {
        if len >= buf.len() {
            return 0;
        }
        buf[d] = 0;
    } else {
        len += 1;
    }
    len
}

/// Serialize into a fresh byte vector, without the trailing NUL.
pub fn encode(list: Option<&Sexp>,mode: Format) -> Vec<u8> {
    let need = sprint(list,mode,None);
    let mut buf = vec![0;need];
    let written = sprint(list,mode,Some(&mut buf));
    buf.truncate(written);
    buf
}

impl Sexp {
    pub fn sprint(&self,mode: Format,buffer: Option<&mut [u8]>) -> usize {
        sprint(Some(self),mode,buffer)
    }
    pub fn encode(&self,mode: Format) -> Vec<u8> {
        encode(Some(self),mode)
    }
}
