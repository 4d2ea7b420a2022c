//! Splitting of the period grid into contiguous chunks searched independently

use crate::data::TimeSeries;
use crate::error::InputError;
use crate::float_trait::Float;
use crate::merge::ChunkOutput;
use crate::search::Pbls;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Chunk `index` of the grid split into `total` chunks
///
/// For $N$ periods the first $N \bmod C$ chunks have $\lfloor N / C \rfloor + 1$ periods and the
/// rest have $\lfloor N / C \rfloor$, so chunks of the same grid tile it without gaps and
/// overlaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ChunkParameters", into = "ChunkParameters")]
pub struct Chunk {
    index: usize,
    total: usize,
}

impl Chunk {
    pub fn new(index: usize, total: usize) -> Result<Self, InputError> {
        if total == 0 {
            return Err(InputError::ZeroChunks);
        }
        if index >= total {
            return Err(InputError::ChunkOutOfRange { index, total });
        }
        Ok(Self { index, total })
    }

    /// All chunks of the grid in index order
    pub fn all(total: usize) -> Result<impl Iterator<Item = Self>, InputError> {
        if total == 0 {
            return Err(InputError::ZeroChunks);
        }
        Ok((0..total).map(move |index| Self { index, total }))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Index range of the chunk in a grid of `n` periods
    pub fn range(&self, n: usize) -> Range<usize> {
        let base = n / self.total;
        let rem = n % self.total;
        let count = if self.index < rem { base + 1 } else { base };
        let start = self.index * base + usize::min(self.index, rem);
        start..start + count
    }

    pub fn slice<'a, T>(&self, periods: &'a [T]) -> &'a [T] {
        &periods[self.range(periods.len())]
    }

    /// Search this chunk of the full period grid
    pub fn run<T>(
        &self,
        pbls: &Pbls<T>,
        ts: &TimeSeries<T>,
        all_periods: &[T],
    ) -> Result<ChunkOutput<T>, InputError>
    where
        T: Float,
    {
        let periods = self.slice(all_periods);
        debug!(
            "Chunk {}/{}: searching {} of {} periods",
            self.index,
            self.total,
            periods.len(),
            all_periods.len()
        );
        let result = pbls.search(ts, periods)?;
        Ok(ChunkOutput {
            chunk: *self,
            result,
        })
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Chunk")]
struct ChunkParameters {
    index: usize,
    total: usize,
}

impl From<Chunk> for ChunkParameters {
    fn from(chunk: Chunk) -> Self {
        Self {
            index: chunk.index,
            total: chunk.total,
        }
    }
}

impl TryFrom<ChunkParameters> for Chunk {
    type Error = InputError;

    fn try_from(p: ChunkParameters) -> Result<Self, Self::Error> {
        Self::new(p.index, p.total)
    }
}

impl JsonSchema for Chunk {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        ChunkParameters::schema_name()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        ChunkParameters::json_schema(generator)
    }
}
