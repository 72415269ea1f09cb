//! Workload producer: draws the `MessageCreate` events the scheduler
//! dispatches, via one of three host-pair selection strategies.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::scheduler::Event;
use crate::world::World;

/// Result of asking a generator for its next event.
pub enum GeneratorOutcome {
    Emit(Event),
    /// No eligible candidate this attempt; retry at `now + polling_interval`.
    Poll(f64),
    /// Workload budget exhausted; the caller should schedule `SimEnd`.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairFilter {
    /// Only same-cluster pairs (the INTRA cluster-pair generator).
    Intra,
    /// Only cross-cluster pairs (the INTER cluster-pair generator).
    Inter,
}

/// A half-open `[start, end)` restriction on which host addresses a
/// generator may draw from; `None` means unrestricted.
pub type HostRange = Option<(u32, u32)>;

fn in_range(address: u32, range: HostRange) -> bool {
    range.is_none_or(|(start, end)| address >= start && address < end)
}

/// Uniform pair + distance-binning generator.
#[derive(Debug, Clone)]
pub struct ActiveHostGenerator {
    pub bin_width: f64,
    pub cap_per_bin: u32,
    pub message_size: u64,
    pub polling_interval: f64,
    pub max_attempts_per_call: u32,
    from_candidates: Vec<usize>,
    to_candidates: Vec<usize>,
    bins: std::collections::HashMap<u64, u32>,
    all_bins: std::collections::HashSet<u64>,
}

impl ActiveHostGenerator {
    pub fn new(world: &World, bin_width: f64, cap_per_bin: u32, message_size: u64, polling_interval: f64, host_range: HostRange, to_host_range: HostRange) -> Self {
        let from_candidates: Vec<usize> = (0..world.hosts.len()).filter(|&i| in_range(world.hosts[i].address, host_range)).collect();
        let to_candidates: Vec<usize> = (0..world.hosts.len()).filter(|&i| in_range(world.hosts[i].address, to_host_range)).collect();

        let mut all_bins = std::collections::HashSet::new();
        for &i in &from_candidates {
            for &j in &to_candidates {
                let a = &world.hosts[i];
                let b = &world.hosts[j];
                if a.address == b.address {
                    continue;
                }
                let dist = a.location.distance_to(&b.location);
                all_bins.insert((dist / bin_width).floor() as u64);
            }
        }
        Self {
            bin_width,
            cap_per_bin,
            message_size,
            polling_interval,
            max_attempts_per_call: 64,
            from_candidates,
            to_candidates,
            bins: std::collections::HashMap::new(),
            all_bins,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.all_bins.iter().all(|bin| *self.bins.get(bin).unwrap_or(&0) >= self.cap_per_bin)
    }

    pub fn next_event(&mut self, now: f64, world: &World, rng: &mut ChaCha8Rng) -> GeneratorOutcome {
        if self.from_candidates.is_empty() || self.to_candidates.is_empty() || self.is_exhausted() {
            return GeneratorOutcome::Exhausted;
        }
        for _ in 0..self.max_attempts_per_call {
            let from_idx = self.from_candidates[rng.gen_range(0..self.from_candidates.len())];
            let to_idx = self.to_candidates[rng.gen_range(0..self.to_candidates.len())];
            if from_idx == to_idx {
                continue;
            }
            let from = &world.hosts[from_idx];
            let to = &world.hosts[to_idx];
            let dist = from.location.distance_to(&to.location);
            let bin = (dist / self.bin_width).floor() as u64;
            let count = self.bins.entry(bin).or_insert(0);
            if *count < self.cap_per_bin {
                *count += 1;
                return GeneratorOutcome::Emit(Event::MessageCreate {
                    from: from.address,
                    to: to.address,
                    size_bytes: self.message_size,
                    time: now,
                });
            }
        }
        GeneratorOutcome::Poll(now + self.polling_interval)
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    pairs: Vec<(u32, u32)>,
    remaining: u32,
}

/// Pre-materialized host-pair generator: covers both `StaticHostMessageGenerator`
/// and the cluster-restricted variant (via `filter`).
#[derive(Debug, Clone)]
pub struct StaticPairGenerator {
    pub message_size: u64,
    pub count_per_bucket: u32,
    pub bin_width: Option<f64>,
    pub filter: Option<PairFilter>,
    pub host_range: HostRange,
    pub to_host_range: HostRange,
    buckets: Option<Vec<Bucket>>,
}

impl StaticPairGenerator {
    pub fn new(message_size: u64, count_per_bucket: u32, bin_width: Option<f64>, filter: Option<PairFilter>, host_range: HostRange, to_host_range: HostRange) -> Self {
        Self { message_size, count_per_bucket, bin_width, filter, host_range, to_host_range, buckets: None }
    }

    fn materialize(&mut self, world: &World) {
        let mut pairs = Vec::new();
        for a in &world.hosts {
            if !in_range(a.address, self.host_range) {
                continue;
            }
            for b in &world.hosts {
                if a.address == b.address {
                    continue;
                }
                if !in_range(b.address, self.to_host_range) {
                    continue;
                }
                match self.filter {
                    Some(PairFilter::Intra) if a.cluster_id != b.cluster_id => continue,
                    Some(PairFilter::Inter) if a.cluster_id == b.cluster_id => continue,
                    _ => {}
                }
                pairs.push((a.address, b.address));
            }
        }

        let buckets = if let Some(width) = self.bin_width {
            let mut by_bin: std::collections::BTreeMap<u64, Vec<(u32, u32)>> = std::collections::BTreeMap::new();
            for (from, to) in pairs {
                let a = world.hosts.iter().find(|h| h.address == from).unwrap();
                let b = world.hosts.iter().find(|h| h.address == to).unwrap();
                let bin = (a.location.distance_to(&b.location) / width).floor() as u64;
                by_bin.entry(bin).or_default().push((from, to));
            }
            by_bin.into_values().map(|pairs| Bucket { pairs, remaining: self.count_per_bucket }).collect()
        } else {
            pairs.into_iter().map(|pair| Bucket { pairs: vec![pair], remaining: self.count_per_bucket }).collect()
        };
        self.buckets = Some(buckets);
    }

    pub fn next_event(&mut self, now: f64, world: &World, rng: &mut ChaCha8Rng) -> GeneratorOutcome {
        if self.buckets.is_none() {
            self.materialize(world);
        }
        let buckets = self.buckets.as_mut().unwrap();
        let non_empty: Vec<usize> = buckets.iter().enumerate().filter(|(_, b)| b.remaining > 0).map(|(i, _)| i).collect();
        if non_empty.is_empty() {
            return GeneratorOutcome::Exhausted;
        }
        let bucket_idx = non_empty[rng.gen_range(0..non_empty.len())];
        let bucket = &mut buckets[bucket_idx];
        let pair_idx = rng.gen_range(0..bucket.pairs.len());
        let (from, to) = bucket.pairs[pair_idx];
        bucket.remaining -= 1;
        GeneratorOutcome::Emit(Event::MessageCreate { from, to, size_bytes: self.message_size, time: now })
    }
}

#[derive(Debug, Clone)]
pub enum Generator {
    ActiveHost(ActiveHostGenerator),
    StaticPair(StaticPairGenerator),
}

impl Generator {
    pub fn next_event(&mut self, now: f64, world: &World, rng: &mut ChaCha8Rng) -> GeneratorOutcome {
        match self {
            Generator::ActiveHost(g) => g.next_event(now, world, rng),
            Generator::StaticPair(g) => g.next_event(now, world, rng),
        }
    }
}
