//! Horizontally partitioned minimal perfect hash function.

use std::io;

use binout::{AsIs, Serializer};
use dyn_size_of::GetSize;
use rayon::prelude::*;

use crate::conf::BuildConf;
use crate::error::Error;
use crate::function::{Builder, Function};
use crate::stats::AccessStatsCollector;

/// A minimal perfect hash function split into up to 255 partitions.
///
/// Keys are sharded by key modulo the partition count, each shard gets an
/// independent [`Function`], and the per-partition indices are lifted into
/// the global range `[1, N]` by adding the number of keys in all earlier
/// partitions. Shards are disjoint and the offsets are exclusive prefix
/// sums, so the global indices of the original keys cover `{1, ..., N}`
/// exactly.
#[derive(Clone)]
pub struct Partitioned {
    partitions: Box<[Function]>,
    offsets: Box<[u64]>,
}

impl Partitioned {
    /// Buckets `keys` by their remainder and builds every partition
    /// concurrently on the rayon thread pool.
    pub(crate) fn build(keys: &[u64], conf: &BuildConf) -> Result<Self, Error> {
        let partition_count = conf.partitions;
        let mut buckets: Vec<Vec<u64>> =
            (0..partition_count).map(|_| Vec::with_capacity(keys.len() / partition_count + 1)).collect();
        for &k in keys {
            buckets[(k % partition_count as u64) as usize].push(k);
        }

        let mut offsets = Vec::with_capacity(partition_count);
        let mut offset = 0u64;
        for bucket in &buckets {
            offsets.push(offset);
            offset += bucket.len() as u64;
        }

        let partitions: Vec<Function> = buckets
            .into_par_iter()
            .map(|bucket| {
                let mut builder = Builder::new(conf, bucket.len());
                builder.build(bucket, &mut ())?;
                Ok(builder.finish())
            })
            .collect::<Result<_, Error>>()?;

        Ok(Self {
            partitions: partitions.into_boxed_slice(),
            offsets: offsets.into_boxed_slice(),
        })
    }

    /// Returns the index of `key` in `[1, len]`, or 0; see
    /// [`Function::find`] for the contract.
    #[inline]
    pub fn find(&self, key: u64) -> u64 {
        self.find_stats(key, &mut ())
    }

    /// Same as [`find`](Partitioned::find), reporting the visited level
    /// depth within the key's partition to `access_stats`.
    pub fn find_stats<A: AccessStatsCollector>(&self, key: u64, access_stats: &mut A) -> u64 {
        let p = (key % self.partitions.len() as u64) as usize;
        match self.partitions[p].find_stats(key, access_stats) {
            0 => 0,
            local => local + self.offsets[p],
        }
    }

    /// Returns the key mapped to `index` by walking the partitions in order,
    /// or 0 when `index` is outside `[1, len]` or the partitions were built
    /// without reverse maps.
    pub fn key(&self, mut index: u64) -> u64 {
        for partition in self.partitions.iter() {
            let keys_here = partition.len() as u64;
            if index <= keys_here {
                return partition.key(index);
            }
            index -= keys_here;
        }
        0
    }

    /// Returns the total number of keys across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Function::len).sum()
    }

    /// Returns the number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Returns the per-partition functions, in partition order.
    pub fn partitions(&self) -> &[Function] {
        &self.partitions
    }

    /// Returns the number of bytes [`write`](Partitioned::write) will produce.
    pub fn write_bytes(&self) -> usize {
        1 + self.partitions.iter().map(Function::write_bytes).sum::<usize>()
            + (self.partitions.len() - 1) * std::mem::size_of::<u32>()
    }

    /// Writes `self` to `output`: the partition count as a single byte, each
    /// partition's function, then the offsets of partitions 1 and up as
    /// 32-bit values (partition 0's offset is always 0).
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        AsIs::write(output, self.partitions.len() as u8)?;
        self.partitions.iter().try_for_each(|p| p.write(output))?;
        self.offsets[1..].iter().try_for_each(|&o| AsIs::write(output, o as u32))
    }

    /// Reads a partitioned function previously written by
    /// [`write`](Partitioned::write).
    pub fn read(input: &mut dyn io::Read) -> Result<Self, Error> {
        let partition_count: u8 = AsIs::read(input)?;
        if partition_count == 0 {
            return Err(Error::DecodeInvalidHeader { field: "partition count", value: 0 });
        }
        let mut partitions = Vec::with_capacity(partition_count as usize);
        for _ in 0..partition_count {
            partitions.push(Function::read(input)?);
        }
        let mut offsets = Vec::with_capacity(partition_count as usize);
        offsets.push(0);
        for _ in 1..partition_count {
            let offset: u32 = AsIs::read(input)?;
            offsets.push(offset as u64);
        }
        Ok(Self {
            partitions: partitions.into_boxed_slice(),
            offsets: offsets.into_boxed_slice(),
        })
    }
}

impl GetSize for Partitioned {
    fn size_bytes_dyn(&self) -> usize {
        self.partitions.size_bytes_dyn() + self.offsets.size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.partitions.size_bytes_content_dyn() + self.offsets.size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}
