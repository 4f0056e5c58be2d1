use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct ScanMetrics {
    // Region file I/O
    pub total_region_reads: AtomicUsize,
    pub total_region_bytes: AtomicU64,
    pub total_region_read_us: AtomicU64,

    // Cache
    pub total_cache_hits: AtomicUsize,
    pub total_cache_misses: AtomicUsize,
    pub total_cache_bypasses: AtomicUsize,
    pub total_cache_evictions: AtomicUsize,

    // Chunk outcomes
    pub total_chunks_present: AtomicUsize,
    pub total_chunks_absent: AtomicUsize,
    pub total_errors: AtomicUsize,

    // Decompression
    pub total_decompressed_bytes: AtomicU64,
    pub total_decompression_us: AtomicU64,
    pub max_decompression_us: AtomicU64,

    // Session
    pub start_time: Option<Instant>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_region_read(&self, duration: Duration, bytes: usize) {
        self.total_region_reads.fetch_add(1, Ordering::Relaxed);
        self.total_region_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.total_region_read_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.total_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.total_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A region was read but not kept because the cache was full.
    pub fn record_cache_bypass(&self) {
        self.total_cache_bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_eviction(&self) {
        self.total_cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_present(&self) {
        self.total_chunks_present.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_absent(&self) {
        self.total_chunks_absent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decompression(&self, duration: Duration, bytes: usize) {
        let us = duration.as_micros() as u64;
        self.total_decompressed_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.total_decompression_us.fetch_add(us, Ordering::Relaxed);
        self.max_decompression_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn region_reads(&self) -> usize {
        self.total_region_reads.load(Ordering::Relaxed)
    }

    pub fn lookups(&self) -> usize {
        self.total_chunks_present.load(Ordering::Relaxed)
            + self.total_chunks_absent.load(Ordering::Relaxed)
            + self.total_errors.load(Ordering::Relaxed)
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();

        let reads = self.total_region_reads.load(Ordering::Relaxed);
        let read_bytes = self.total_region_bytes.load(Ordering::Relaxed);
        let read_time = self.total_region_read_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let read_avg = if reads > 0 { read_time / reads as f64 } else { 0.0 };

        let hits = self.total_cache_hits.load(Ordering::Relaxed);
        let misses = self.total_cache_misses.load(Ordering::Relaxed);
        let bypasses = self.total_cache_bypasses.load(Ordering::Relaxed);
        let evictions = self.total_cache_evictions.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 { (hits as f64 / total_requests as f64) * 100.0 } else { 0.0 };

        let present = self.total_chunks_present.load(Ordering::Relaxed);
        let absent = self.total_chunks_absent.load(Ordering::Relaxed);
        let errors = self.total_errors.load(Ordering::Relaxed);

        let inflated = self.total_decompressed_bytes.load(Ordering::Relaxed);
        let inflate_time = self.total_decompression_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let inflate_max = self.max_decompression_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let inflate_avg = if present > 0 { inflate_time / present as f64 } else { 0.0 };

        format!(
            "mcregion Scan Report\n\
             ====================\n\
             Session Duration: {:.2?}\n\n\
             [Lookups]\n\
             Present: {}\n\
             Absent: {}\n\
             Errors: {}\n\n\
             [Region Reads]\n\
             Files Read: {}\n\
             Bytes Read: {}\n\
             Avg Time: {:.2} ms/file\n\n\
             [Cache]\n\
             Hits: {}\n\
             Misses: {}\n\
             Bypassed (full): {}\n\
             Evictions: {}\n\
             Hit Rate: {:.1}%\n\n\
             [Decompression]\n\
             Bytes Out: {}\n\
             Avg Time: {:.2} ms/chunk\n\
             Max Time: {:.2} ms\n",
            uptime,
            present, absent, errors,
            reads, read_bytes, read_avg,
            hits, misses, bypasses, evictions, hit_rate,
            inflated, inflate_avg, inflate_max
        )
    }
}
