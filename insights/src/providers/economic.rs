use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;

use super::EconomicRecord;
use crate::cache::TtlCache;
use crate::config::EconomicConfig;

/// Economic indicators served from a static table. There is no network call; the cache only
/// keeps the same lookup contract as the other providers.
pub struct EconomicProvider {
    indicators: BTreeMap<String, EconomicRecord>,
    cache: TtlCache<String, EconomicRecord>,
}

impl EconomicProvider {
    pub fn new(config: EconomicConfig) -> Self {
        Self {
            indicators: config.indicators,
            cache: TtlCache::new(Duration::from_secs(config.cache_ttl_secs)),
        }
    }

    /// Indicators for an ISO-3 code. Unknown codes (including "N/A") get the fallback record.
    pub async fn get_economic(&self, country_code: &str) -> EconomicRecord {
        let key = country_code.to_string();
        if let Some(record) = self.cache.get(&key).await {
            return record;
        }
        let record = match self.indicators.get(country_code) {
            Some(record) => record.clone(),
            None => {
                debug!("no economic indicators for '{country_code}', using defaults");
                EconomicRecord::fallback()
            }
        };
        self.cache.insert(key, record.clone()).await;
        record
    }
}
