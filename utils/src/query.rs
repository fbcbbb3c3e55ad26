//! Read only access to the cells of one candidate transaction, as seen by
//! one script group.

use ckb_types::{
    bytes::Bytes,
    packed::{Byte32, CellInput, CellOutput, Script},
    prelude::*,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Input,
    Output,
    CellDep,
    GroupInput,
    GroupOutput,
}

/// The loaders a script may call.
///
/// Every indexed loader returns `None` once `index` is past the end of
/// `source`; that is the only way iteration over a source terminates.
pub trait CellLoader {
    /// The script currently being executed.
    fn load_script(&self) -> Script;

    fn load_cell(&self, index: usize, source: Source) -> Option<CellOutput>;

    fn load_cell_data(&self, index: usize, source: Source) -> Option<Bytes>;

    /// Only defined for `Input` and `GroupInput`.
    fn load_input(&self, index: usize, source: Source) -> Option<CellInput>;

    fn load_script_hash(&self) -> Byte32 {
        self.load_script().calc_script_hash()
    }

    fn load_cell_lock(&self, index: usize, source: Source) -> Option<Script> {
        self.load_cell(index, source).map(|cell| cell.lock())
    }

    fn load_cell_lock_hash(&self, index: usize, source: Source) -> Option<Byte32> {
        self.load_cell_lock(index, source)
            .map(|lock| lock.calc_script_hash())
    }

    /// The inner `Option` is the cell's type script, which may be absent.
    fn load_cell_type(&self, index: usize, source: Source) -> Option<Option<Script>> {
        self.load_cell(index, source).map(|cell| cell.type_().to_opt())
    }

    fn load_cell_type_hash(&self, index: usize, source: Source) -> Option<Option<Byte32>> {
        self.load_cell_type(index, source)
            .map(|type_| type_.map(|script| script.calc_script_hash()))
    }

    fn load_cell_capacity(&self, index: usize, source: Source) -> Option<u64> {
        self.load_cell(index, source)
            .map(|cell| cell.capacity().unpack())
    }

    fn load_input_since(&self, index: usize, source: Source) -> Option<u64> {
        self.load_input(index, source)
            .map(|input| input.since().unpack())
    }
}

/// Walks a source from index 0, yielding `query(loader, index, source)` until
/// the query reports out of bound.
///
/// A query that wants to skip a cell returns `Some(None)` and the caller
/// flattens; a query that can fail returns `Some(Err(_))`.
pub struct QueryIter<'a, L: ?Sized, F> {
    loader: &'a L,
    query: F,
    index: usize,
    source: Source,
}

impl<'a, L, F, T> QueryIter<'a, L, F>
where
    L: CellLoader + ?Sized,
    F: FnMut(&L, usize, Source) -> Option<T>,
{
    pub fn new(loader: &'a L, query: F, source: Source) -> Self {
        QueryIter {
            loader,
            query,
            index: 0,
            source,
        }
    }
}

impl<'a, L, F, T> Iterator for QueryIter<'a, L, F>
where
    L: CellLoader + ?Sized,
    F: FnMut(&L, usize, Source) -> Option<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = (self.query)(self.loader, self.index, self.source)?;
        self.index += 1;
        Some(item)
    }
}

/// Equality of nullable 32 byte hashes, where an all zero hash also means
/// absent.
pub fn option_bytes_eq(a: Option<&[u8]>, b: Option<&[u8]>) -> bool {
    fn present(v: Option<&[u8]>) -> Option<&[u8]> {
        v.filter(|bytes| bytes.iter().any(|b| *b != 0))
    }
    present(a) == present(b)
}

pub fn hash32(hash: &Byte32) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_slice());
    out
}
