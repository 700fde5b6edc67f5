use derive_more::Constructor;

/// Swarm statistics for one torrent.
///
/// This is what a scrape reports for each info hash, and what an extended
/// (version 2) announce reply carries as seeders/leechers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Constructor)]
pub struct SwarmMetadata {
    /// (i.e `completed`): The number of peers that have ever completed downloading
    pub downloaded: u32,
    /// (i.e `seeders`): The number of active peers that have completed downloading (seeders)
    pub complete: u32,
    /// (i.e `leechers`): The number of active peers that have not completed downloading (leechers)
    pub incomplete: u32,
}

impl SwarmMetadata {
    #[must_use]
    pub fn zeroed() -> Self {
        Self::default()
    }
}
