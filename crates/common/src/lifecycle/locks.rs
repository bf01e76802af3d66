use tokio::sync::{Mutex, MutexGuard};

use crate::gate::SecretId;

pub const DEFAULT_LOCK_STRIPES: usize = 256;

/// A fixed set of async mutexes; an id always maps to the same one.
///
/// Holding the guard for an id serializes every read-modify-write on that id
///  within this process. Unrelated ids only contend when they share a stripe.
#[derive(Debug)]
pub struct IdLocks {
    stripes: Box<[Mutex<()>]>,
}

impl IdLocks {
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    fn stripe(&self, id: &SecretId) -> usize {
        let bits = id.as_uuid().as_u128();
        let folded = (bits as u64) ^ ((bits >> 64) as u64);
        (folded % self.stripes.len() as u64) as usize
    }

    pub async fn lock(&self, id: &SecretId) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe(id)].lock().await
    }
}

impl Default for IdLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_STRIPES)
    }
}
