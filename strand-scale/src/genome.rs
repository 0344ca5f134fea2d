//! Genomic coordinates.
//!
//! A genome is an ordered chromosome table with cumulative offsets, so
//! every `"chr<C>:<P>"` locus collapses to one genome-wide index:
//! `abs_index(C, P) = offset(C) + P`. A [`GenomeScale`] is then a plain
//! linear scale from the *requested* domain's indices (not the whole
//! genome) to clip space — zooming into one chromosome keeps full f64
//! resolution for the visible region.
//!
//! The registry is injectable: tests build synthetic genomes with
//! [`Genome::custom`], production code uses [`Genome::hg38`].

use std::sync::Arc;

use log::trace;
use rustc_hash::FxHashMap;

use crate::linear::{format_tick, pow10_step, LinearScale};
use crate::{ScaleError, Tick};

/// hg38 primary assembly lengths, in karyotype order.
const HG38: &[(&str, u64)] = &[
    ("chr1", 248_956_422),
    ("chr2", 242_193_529),
    ("chr3", 198_295_559),
    ("chr4", 190_214_555),
    ("chr5", 181_538_259),
    ("chr6", 170_805_979),
    ("chr7", 159_345_973),
    ("chr8", 145_138_636),
    ("chr9", 138_394_717),
    ("chr10", 133_797_422),
    ("chr11", 135_086_622),
    ("chr12", 133_275_309),
    ("chr13", 114_364_328),
    ("chr14", 107_043_718),
    ("chr15", 101_991_189),
    ("chr16", 90_338_345),
    ("chr17", 83_257_441),
    ("chr18", 80_373_285),
    ("chr19", 58_617_616),
    ("chr20", 64_444_167),
    ("chr21", 46_709_983),
    ("chr22", 50_818_468),
    ("chrX", 156_040_895),
    ("chrY", 57_227_415),
];

/// A chromosome within the concatenated genome-wide coordinate.
#[derive(Clone, Debug)]
struct Chromosome {
    name: String,
    length: u64,
    /// Sum of all preceding chromosome lengths.
    offset: u64,
}

/// A single genomic position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locus {
    pub chromosome: String,
    pub position: u64,
}

/// Ordered chromosome table + cumulative offsets + name index.
/// Built once per genome and shared via `Arc`.
#[derive(Clone, Debug)]
pub struct Genome {
    id: String,
    chromosomes: Vec<Chromosome>,
    index: FxHashMap<String, usize>,
    total: u64,
}

impl Genome {
    /// Build from an explicit chromosome table (order is preserved).
    pub fn custom(id: &str, table: &[(&str, u64)]) -> Arc<Genome> {
        let mut chromosomes = Vec::with_capacity(table.len());
        let mut index = FxHashMap::default();
        let mut offset = 0u64;
        for &(name, length) in table {
            index.insert(name.to_string(), chromosomes.len());
            chromosomes.push(Chromosome {
                name: name.to_string(),
                length,
                offset,
            });
            offset += length;
        }
        Arc::new(Genome {
            id: id.to_string(),
            chromosomes,
            index,
            total: offset,
        })
    }

    pub fn hg38() -> Arc<Genome> {
        Self::custom("hg38", HG38)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Total concatenated length.
    pub fn total_length(&self) -> u64 {
        self.total
    }

    /// Genome-wide index of a (chromosome, position) pair.
    pub fn abs_index(&self, chromosome: &str, position: u64) -> Result<u64, ScaleError> {
        let i = self
            .index
            .get(chromosome)
            .ok_or_else(|| ScaleError::UnknownChromosome(chromosome.to_string()))?;
        Ok(self.chromosomes[*i].offset + position)
    }

    /// Parse `"chr<C>:<P>"` and collapse to the genome-wide index.
    pub fn abs_index_of(&self, locus: &str) -> Result<u64, ScaleError> {
        let (chromosome, position) = parse_locus(locus)?;
        self.abs_index(chromosome, position)
    }

    /// Recover (chromosome, local position) from a genome-wide index:
    /// scan the offset table for the first chromosome whose cumulative
    /// length reaches the index.
    pub fn locus_at(&self, index: u64) -> Locus {
        for chrom in &self.chromosomes {
            if chrom.offset + chrom.length >= index {
                return Locus {
                    chromosome: chrom.name.clone(),
                    position: index.saturating_sub(chrom.offset),
                };
            }
        }
        // Past the end: clamp to the last chromosome.
        let last = self
            .chromosomes
            .last()
            .expect("genome has at least one chromosome");
        Locus {
            chromosome: last.name.clone(),
            position: last.length,
        }
    }
}

/// Split `"chr1:1000"` into name and position.
pub fn parse_locus(locus: &str) -> Result<(&str, u64), ScaleError> {
    let (chromosome, position) = locus
        .split_once(':')
        .ok_or_else(|| ScaleError::BadLocus(locus.to_string()))?;
    let position = position
        .parse::<u64>()
        .map_err(|_| ScaleError::BadLocus(locus.to_string()))?;
    Ok((chromosome, position))
}

/// Linear scale over the genome-wide indices of a requested locus pair.
#[derive(Clone, Debug)]
pub struct GenomeScale {
    genome: Arc<Genome>,
    inner: LinearScale,
    domain: [Locus; 2],
}

impl GenomeScale {
    /// Build for a requested `["chr<C>:<P>", "chr<C>:<P>"]` domain,
    /// mapping to [-1, 1] clip space.
    pub fn new(genome: Arc<Genome>, domain: [&str; 2]) -> Result<Self, ScaleError> {
        let a = genome.abs_index_of(domain[0])?;
        let b = genome.abs_index_of(domain[1])?;
        // Reversed locus pairs are accepted; the stored domain always
        // runs min to max so downstream position arithmetic holds.
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let inner = LinearScale::to_clip([lo as f64, hi as f64])?;
        trace!(
            "genome scale {}: [{}, {}] -> clip",
            genome.id(),
            domain[0],
            domain[1]
        );
        let domain = [
            genome.locus_at(lo),
            genome.locus_at(hi),
        ];
        Ok(Self {
            genome,
            inner,
            domain,
        })
    }

    /// Clip-space position of a `"chr<C>:<P>"` string.
    pub fn to_clip(&self, locus: &str) -> Result<f64, ScaleError> {
        Ok(self.inner.apply(self.genome.abs_index_of(locus)? as f64))
    }

    /// Clip-space position of a genome-wide index.
    #[inline]
    pub fn to_clip_abs(&self, index: f64) -> f64 {
        self.inner.apply(index)
    }

    /// Map a clip value back to (chromosome, local position).
    pub fn invert(&self, clip: f64) -> Result<Locus, ScaleError> {
        let index = self.inner.invert()?.apply(clip);
        Ok(self.genome.locus_at(index.max(0.0).round() as u64))
    }

    /// The underlying index→clip scale.
    pub fn inner(&self) -> &LinearScale {
        &self.inner
    }

    pub fn domain(&self) -> &[Locus; 2] {
        &self.domain
    }

    /// Ticks in genome-wide index space.
    ///
    /// Same chromosome: a power-of-ten step over local positions, aligned
    /// to step multiples. Different chromosomes: one tick per chromosome
    /// boundary inside the domain, labeled with the chromosome name.
    pub fn ticks(&self) -> Vec<Tick> {
        let [lo, hi] = &self.domain;
        if lo.chromosome == hi.chromosome {
            let offset = self
                .genome
                .abs_index(&lo.chromosome, 0)
                .expect("domain chromosome is in the genome") as f64;
            let span = (hi.position - lo.position) as f64;
            if span <= 0.0 {
                return Vec::new();
            }
            let step = pow10_step(span);
            let mut ticks = Vec::new();
            let mut local = (lo.position as f64 / step).ceil() * step;
            while local <= hi.position as f64 {
                ticks.push(Tick {
                    position: offset + local,
                    label: format_tick(local),
                });
                local += step;
            }
            ticks
        } else {
            let lo_abs = self.inner.domain()[0];
            let hi_abs = self.inner.domain()[1];
            self.genome
                .chromosomes
                .iter()
                .filter(|c| (c.offset as f64) >= lo_abs && (c.offset as f64) <= hi_abs)
                .map(|c| Tick {
                    position: c.offset as f64,
                    label: c.name.clone(),
                })
                .collect()
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
