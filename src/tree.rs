//! # Tree Module
//!
//! An expression tree is a single owned byte sequence: a depth-first
//! linearization of the S-expression using one-byte tags.  `OPEN` and `CLOSE`
//! bracket lists, `DATA` carries a 16-bit length and that many raw bytes, and
//! exactly one `STOP` terminates the stream.  There are no pointers and no
//! auxiliary indices; navigation is a linear scan, and a sensitive tree can be
//! wiped wholesale because it is one block.
//!
//! `TreeBuilder` is the growable cursor buffer the scanner and navigator emit
//! into.  A finished buffer passes through `normalize`, which maps the empty
//! string and the empty list to the distinguished absent tree (`None`).

use std::fmt;
use log::debug;
use crate::mem::{Block,MemClass};

pub const STOP: u8 = 0;
pub const DATA: u8 = 1;
pub const HINT: u8 = 2;
pub const OPEN: u8 = 3;
pub const CLOSE: u8 = 4;

/// width of the length field that follows a `DATA` or `HINT` tag
pub const LEN_SIZE: usize = 2;

/// Largest atom the length field can carry.
pub const MAX_ATOM: usize = u16::MAX as usize;

/// Enumerates tree buffer errors.  The `Display` trait will print the
/// equivalent long message.
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("atom exceeds the 65535 byte wire limit")]
    AtomTooBig
}

pub(crate) fn get_len(stream: &[u8],pos: usize) -> usize {
    u16::from_le_bytes([stream[pos],stream[pos+1]]) as usize
}

/// An owned S-expression tree.  The in-memory layout is not part of the
/// contract; use the navigator and serializer operations.
pub struct Sexp {
    block: Block,
    end: usize
}

impl Sexp {
    pub(crate) fn stream(&self) -> &[u8] {
        &self.block.bytes()[..self.end]
    }
    /// Whether the backing storage is in the sensitive class.  Trees become
    /// sensitive when a sensitive big integer is inserted during scanning and
    /// stay that way for their entire lifetime.
    pub fn is_sensitive(&self) -> bool {
        self.block.is_sensitive()
    }
    /// Write the diagnostic rendering to standard error.
    pub fn dump(&self) {
        eprint!("{}",dump_string(Some(self)));
    }
}

impl PartialEq for Sexp {
    fn eq(&self,other: &Self) -> bool {
        self.stream()==other.stream()
    }
}

impl fmt::Debug for Sexp {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{}",dump_string(Some(self)))
    }
}

/// Pass a finished tree through except when it is empty.  The empty string
/// (bare `STOP`) and the empty list (`OPEN CLOSE STOP`) both become `None`,
/// the distinguished absent tree.
pub(crate) fn normalize(sexp: Sexp) -> Option<Sexp> {
    let d = sexp.stream();
    if d[0]==STOP {
        return None;
    }
    if d[0]==OPEN && d[1]==CLOSE {
        return None;
    }
    Some(sexp)
}

/// Growable tagged stream with a cursor.  Begins in the ordinary memory
/// class; inserting sensitive material upgrades the whole buffer exactly once.
pub struct TreeBuilder {
    block: Block,
    pos: usize
}

impl TreeBuilder {
    /// A good starting capacity is the source text length: the internal form
    /// is never larger than the surface form it was scanned from.
    pub fn new(capacity: usize) -> Self {
        Self {
            block: Block::obtain(capacity + LEN_SIZE,MemClass::Ordinary),
            pos: 0
        }
    }
    /// Guarantee room for `n` payload bytes plus a length field and one tag
    /// beyond the cursor.  Growth doubles the requested slack so a run of
    /// small writes does not reallocate every time.
    fn make_space(&mut self,n: usize) {
        if self.pos + n + LEN_SIZE + 1 >= self.block.len() {
            let new_size = self.block.len() + 2*(n + LEN_SIZE + 1);
            self.block.grow(new_size);
        }
    }
    fn put_tag(&mut self,tag: u8) {
        self.make_space(0);
        self.block.bytes_mut()[self.pos] = tag;
        self.pos += 1;
    }
    pub fn put_open(&mut self) {
        self.put_tag(OPEN);
    }
    pub fn put_close(&mut self) {
        self.put_tag(CLOSE);
    }
    pub fn put_stop(&mut self) {
        self.put_tag(STOP);
    }
    /// Emit a `DATA` node.  Atoms are capped at 65535 bytes by the length
    /// field; a longer payload is refused rather than stored with a
    /// truncated length.
    pub fn put_data(&mut self,bytes: &[u8]) -> Result<(),Error> {
        if bytes.len() > MAX_ATOM {
            return Err(Error::AtomTooBig);
        }
        self.make_space(bytes.len());
        let d = self.block.bytes_mut();
        d[self.pos] = DATA;
        d[self.pos+1..self.pos+1+LEN_SIZE].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
        d[self.pos+1+LEN_SIZE..self.pos+1+LEN_SIZE+bytes.len()].copy_from_slice(bytes);
        self.pos += 1 + LEN_SIZE + bytes.len();
        Ok(())
    }
    /// Copy an already-linearized span verbatim (used when extracting
    /// sub-trees).
    pub fn put_raw(&mut self,bytes: &[u8]) {
        self.make_space(bytes.len());
        self.block.bytes_mut()[self.pos..self.pos+bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
    /// Move the buffer to the sensitive class, preserving the cursor.
    pub fn upgrade_to_sensitive(&mut self) {
        if !self.block.is_sensitive() {
            debug!("tree storage switching to sensitive class");
            self.block.upgrade();
        }
    }
    pub fn is_sensitive(&self) -> bool {
        self.block.is_sensitive()
    }
    /// Normalize and hand the tree to the caller.  The stream must already be
    /// terminated with `put_stop`.
    pub fn finish(self) -> Option<Sexp> {
        normalize(Sexp { block: self.block, end: self.pos })
    }
}

/// Render the tag stream as diagnostic text, one node per line with two-space
/// indentation per depth.  Data bytes are shown with backslash escapes so the
/// output stays printable.
pub fn dump_string(list: Option<&Sexp>) -> String {
    let mut out = String::new();
    let sexp = match list {
        Some(s) => s,
        None => return String::from("[nil]\n")
    };
    let d = sexp.stream();
    let mut p = 0;
    let mut indent: usize = 0;
    while d[p] != STOP {
        let tag = d[p];
        p += 1;
        match tag {
            OPEN => {
                out += &format!("{}[open]\n","  ".repeat(indent));
                indent += 1;
            },
            CLOSE => {
                if indent > 0 {
                    indent -= 1;
                }
                out += &format!("{}[close]\n","  ".repeat(indent));
            },
            DATA => {
                let n = get_len(d,p);
                p += LEN_SIZE;
                out += &format!("{}[data=\"","  ".repeat(indent));
                dump_bytes(&mut out,&d[p..p+n],b'"');
                out += "\"]\n";
                p += n;
            },
            _ => {
                out += &format!("{}[unknown tag {}]\n","  ".repeat(indent),tag);
            }
        }
    }
    out
}

fn dump_bytes(out: &mut String,bytes: &[u8],delim: u8) {
    for &b in bytes {
        if (b & 0x80) != 0 || b < 0x20 || b==0x7f || b==delim {
            out.push('\\');
            match b {
                b'\n' => out.push('n'),
                b'\r' => out.push('r'),
                12 => out.push('f'),
                11 => out.push('v'),
                8 => out.push('b'),
                0 => out.push('0'),
                _ => out.push_str(&format!("x{:02x}",b))
            }
        } else {
            out.push(b as char);
        }
    }
}

#[test]
fn builder_growth() {
    // start tiny so every write reallocates at least once
    let mut bld = TreeBuilder::new(0);
    bld.put_open();
    bld.put_data(b"abcdefghijklmnop").expect("atom error");
    bld.put_data(&[0u8;100]).expect("atom error");
    bld.put_close();
    bld.put_stop();
    let sexp = bld.finish().expect("tree should not normalize away");
    let d = sexp.stream();
    assert_eq!(d[0],OPEN);
    assert_eq!(d[1],DATA);
    assert_eq!(get_len(d,2),16);
    assert_eq!(d[d.len()-1],STOP);
}

#[test]
fn normalize_empty_forms() {
    let mut bld = TreeBuilder::new(0);
    bld.put_stop();
    assert!(bld.finish().is_none());
    let mut bld = TreeBuilder::new(2);
    bld.put_open();
    bld.put_close();
    bld.put_stop();
    assert!(bld.finish().is_none());
}

#[test]
fn atom_size_cap() {
    let mut bld = TreeBuilder::new(0);
    assert_eq!(bld.put_data(&vec![0;MAX_ATOM+1]),Err(Error::AtomTooBig));
    bld.put_data(&vec![7;MAX_ATOM]).expect("atom error");
    bld.put_stop();
    let sexp = bld.finish().expect("tree should not normalize away");
    let d = sexp.stream();
    assert_eq!(d[0],DATA);
    assert_eq!(get_len(d,1),MAX_ATOM);
}

#[test]
fn dump_escaping() {
    let mut bld = TreeBuilder::new(16);
    bld.put_open();
    bld.put_data(&[b'a',0x0a,0x00,0xff,b'"']).expect("atom error");
    bld.put_close();
    bld.put_stop();
    let sexp = bld.finish().unwrap();
    let txt = dump_string(Some(&sexp));
    assert_eq!(txt,"[open]\n  [data=\"a\\n\\0\\xff\\\"\"]\n[close]\n");
    assert_eq!(dump_string(None),"[nil]\n");
}
