use std::io;

/// Dedicated multi-threaded runtime for file IO and parsing.
///
/// The render loop never blocks on it: work is spawned through [`IoTaskPool::handle`]
/// and results come back over channels.
pub struct IoTaskPool {
    runtime: tokio::runtime::Runtime,
}

impl IoTaskPool {
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("behngine-io")
            .build()?;

        log::debug!("IO task pool started");
        Ok(Self { runtime })
    }

    pub fn handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }
}
