//! # Navigator Module
//!
//! Read-only structural access: element counting, `car`/`cdr`-style
//! extraction, typed atom access, and token search.  Every operation that
//! returns a tree allocates a fresh one in the ordinary memory class and
//! hands ownership to the caller; the input tree is never modified.  The
//! linear representation cannot share subtrees, so extraction always copies.

use crate::tree::{Sexp,TreeBuilder,get_len,STOP,DATA,OPEN,CLOSE,LEN_SIZE};
use crate::mpi::{Mpi,MpiFormat};

/// Index one past the node whose tag sits at `start`.  For `OPEN` this walks
/// to the matching `CLOSE`.
fn node_end(d: &[u8],start: usize) -> usize {
    match d[start] {
        DATA => start + 1 + LEN_SIZE + get_len(d,start+1),
        OPEN => {
            let mut p = start + 1;
            let mut level = 1;
            while level > 0 {
                match d[p] {
                    DATA => p += 1 + LEN_SIZE + get_len(d,p+1),
                    OPEN => {
                        level += 1;
                        p += 1;
                    },
                    CLOSE => {
                        level -= 1;
                        p += 1;
                    },
                    _ => panic!("corrupt expression stream")
                }
            }
            p
        },
        _ => start + 1
    }
}

/// Step over `number` elements starting at tag position `p`.  Returns the
/// position of the next tag, or None if the list (or the whole stream) ends
/// first.
fn skip_elements(d: &[u8],mut p: usize,mut number: usize) -> Option<usize> {
    while number > 0 {
        match d[p] {
            DATA | OPEN => {
                p = node_end(d,p);
                number -= 1;
            },
            _ => return None
        }
    }
    Some(p)
}

/// Copy the span `d[start..end]` into a fresh ordinary tree and normalize.
fn extract(d: &[u8],start: usize,end: usize) -> Option<Sexp> {
    let mut bld = TreeBuilder::new(end - start + 1);
    bld.put_raw(&d[start..end]);
    bld.put_stop();
    bld.finish()
}

impl Sexp {
    /// Number of top-level elements: atoms and immediate sub-lists each
    /// count one.
    pub fn length(&self) -> usize {
        let d = self.stream();
        let mut p = 0;
        let mut level: isize = 0;
        let mut length = 0;
        while d[p] != STOP {
            match d[p] {
                DATA => {
                    if level==0 {
                        length += 1;
                    }
                    p += 1 + LEN_SIZE + get_len(d,p+1);
                },
                OPEN => {
                    if level==0 {
                        length += 1;
                    }
                    level += 1;
                    p += 1;
                },
                CLOSE => {
                    level -= 1;
                    p += 1;
                },
                _ => p += 1
            }
        }
        length
    }
    /// The `number`-th top-level element as a fresh tree, or None if this is
    /// not a list or the index is out of range.
    pub fn nth(&self,number: usize) -> Option<Sexp> {
        let d = self.stream();
        if d[0] != OPEN {
            return None;
        }
        let p = skip_elements(d,1,number)?;
        match d[p] {
            DATA | OPEN => extract(d,p,node_end(d,p)),
            _ => None
        }
    }
    pub fn car(&self) -> Option<Sexp> {
        self.nth(0)
    }
    /// Everything after the first top-level element, as a fresh list.
    pub fn cdr(&self) -> Option<Sexp> {
        let d = self.stream();
        if d[0] != OPEN {
            return None;
        }
        let head = skip_elements(d,1,1)?;
        let mut p = head;
        let mut level = 1;
        while level > 0 {
            match d[p] {
                DATA => p += 1 + LEN_SIZE + get_len(d,p+1),
                OPEN => {
                    level += 1;
                    p += 1;
                },
                CLOSE => {
                    level -= 1;
                    if level==0 {
                        // outer close stays with the original
                        break;
                    }
                    p += 1;
                },
                _ => return None
            }
        }
        let mut bld = TreeBuilder::new(p - head + 3);
        bld.put_open();
        bld.put_raw(&d[head..p]);
        bld.put_close();
        bld.put_stop();
        bld.finish()
    }
    pub fn cadr(&self) -> Option<Sexp> {
        let tail = self.cdr()?;
        tail.car()
    }
    /// Raw bytes of the `number`-th element, valid until this tree is
    /// released.  Only atoms qualify; a sub-list returns None.  Index 0 also
    /// accepts a tree that is a single top-level atom rather than a list.
    pub fn nth_data(&self,number: usize) -> Option<&[u8]> {
        let d = self.stream();
        let start = match d[0] {
            OPEN => 1,
            _ if number > 0 => return None,
            _ => 0
        };
        let p = skip_elements(d,start,number)?;
        if d[p]==DATA {
            let n = get_len(d,p+1);
            return Some(&d[p+1+LEN_SIZE..p+1+LEN_SIZE+n]);
        }
        None
    }
    /// Interpret the `number`-th element as a big integer in the given wire
    /// format.  None if the element is not an atom or does not scan.
    pub fn nth_mpi(&self,number: usize,fmt: MpiFormat) -> Option<Mpi> {
        let bytes = self.nth_data(number)?;
        Mpi::scan(bytes,fmt).ok()
    }
    /// Locate the first sub-list, at any depth, whose car is the atom `tok`.
    /// Returns a fresh tree holding that whole sub-list, or None.
    pub fn find_token(&self,tok: &[u8]) -> Option<Sexp> {
        let d = self.stream();
        let mut p = 0;
        while d[p] != STOP {
            if d[p]==OPEN && d[p+1]==DATA {
                let n = get_len(d,p+2);
                let start = p + 2 + LEN_SIZE;
                if n==tok.len() && &d[start..start+n]==tok {
                    return extract(d,p,node_end(d,p));
                }
                // resume right after the car atom so nested lists get tested
                p = start + n;
            } else if d[p]==DATA {
                p += 1 + LEN_SIZE + get_len(d,p+1);
            } else {
                p += 1;
            }
        }
        None
    }
}
