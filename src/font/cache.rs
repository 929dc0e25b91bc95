//! Process-wide typeface cache.
//!
//! Parsed faces are expensive to load, and documents routinely resolve the
//! same family over and over. The cache is module-scoped and initialized on
//! first use; all access happens on the render thread, the mutex only makes
//! the shared state sound.
//!
//! Eviction: when the cache reaches [`TYPEFACE_CACHE_COUNT`] entries, `add`
//! scans from the front and drops up to a quarter of the budget, keeping any
//! entry that still has an outstanding handle (`Arc` strong count > 1).

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::font::face::FaceTypeface;

const TYPEFACE_CACHE_COUNT: usize = 1024;

/// Insertion-ordered typeface list with a linear predicate lookup. The entry
/// count stays small in practice, so a scan beats a keyed map here.
#[derive(Default)]
struct TypefaceCache {
    typefaces: Vec<Arc<FaceTypeface>>,
}

impl TypefaceCache {
    fn add(&mut self, typeface: Arc<FaceTypeface>) {
        if self.typefaces.len() >= TYPEFACE_CACHE_COUNT {
            self.purge();
        }
        self.typefaces.push(typeface);
    }

    fn find_by_predicate(
        &self,
        predicate: impl Fn(&FaceTypeface) -> bool,
    ) -> Option<Arc<FaceTypeface>> {
        self.typefaces.iter().find(|t| predicate(t)).cloned()
    }

    fn purge(&mut self) {
        let mut num_to_purge = TYPEFACE_CACHE_COUNT >> 2;
        let mut index = 0;
        while index < self.typefaces.len() {
            if Arc::strong_count(&self.typefaces[index]) == 1 {
                self.typefaces.remove(index);
                num_to_purge -= 1;
                if num_to_purge == 0 {
                    return;
                }
            } else {
                index += 1;
            }
        }
    }
}

fn get() -> MutexGuard<'static, TypefaceCache> {
    static CACHE: OnceLock<Mutex<TypefaceCache>> = OnceLock::new();
    CACHE
        .get_or_init(|| Mutex::new(TypefaceCache::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn add(typeface: Arc<FaceTypeface>) {
    get().add(typeface);
}

pub(crate) fn find_by_predicate(
    predicate: impl Fn(&FaceTypeface) -> bool,
) -> Option<Arc<FaceTypeface>> {
    get().find_by_predicate(predicate)
}
