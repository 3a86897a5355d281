//! World capitals table used to feed the point layer from the command line.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Embedded table, one row per capital.
pub const CAPITALS_CSV: &str = include_str!("../assets/capitals.csv");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub population: u64,
    pub continent: String,
}

#[derive(Debug, Deserialize)]
struct CapitalRecord {
    name: String,
    country: String,
    lat: Option<f64>,
    lng: Option<f64>,
    population: Option<u64>,
    continent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentSummary {
    pub continent: String,
    pub count: usize,
    pub mean_population: u64,
}

/// Rows backing a point layer. Row `i` is point `i` in the layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapitalStore {
    rows: Vec<Capital>,
}

impl CapitalStore {
    pub fn new(rows: Vec<Capital>) -> Self {
        Self { rows }
    }

    pub fn embedded() -> Result<Self, csv::Error> {
        Self::from_csv(CAPITALS_CSV.as_bytes())
    }

    /// Read a headed CSV. Rows without both coordinates are dropped.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        let mut skipped = 0_usize;
        for record in rdr.deserialize::<CapitalRecord>() {
            let r = record?;
            let (Some(lat), Some(lng)) = (r.lat, r.lng) else {
                skipped += 1;
                continue;
            };
            rows.push(Capital {
                name: r.name,
                country: r.country,
                lat,
                lng,
                population: r.population.unwrap_or(0),
                continent: r.continent,
            });
        }
        debug!(rows = rows.len(), skipped, "capitals loaded");
        Ok(Self { rows })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Capital> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Capital] {
        &self.rows
    }

    /// Rows on one continent (case-insensitive), in original order.
    pub fn on_continent(&self, continent: &str) -> Self {
        Self::new(
            self.rows
                .iter()
                .filter(|r| r.continent.eq_ignore_ascii_case(continent))
                .cloned()
                .collect(),
        )
    }

    /// `[lng0, lat0, lng1, lat1, ...]` for `PointLayer::set_data`.
    pub fn flat_coords(&self) -> Vec<f32> {
        let mut coords = Vec::with_capacity(self.rows.len() * 2);
        for r in &self.rows {
            coords.push(r.lng as f32);
            coords.push(r.lat as f32);
        }
        coords
    }

    /// Per-continent row count and mean population, largest group first.
    pub fn continent_summary(&self) -> Vec<ContinentSummary> {
        let mut groups: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
        for r in &self.rows {
            let g = groups.entry(r.continent.as_str()).or_default();
            g.0 += 1;
            g.1 += r.population;
        }

        let mut out: Vec<ContinentSummary> = groups
            .into_iter()
            .map(|(continent, (count, total))| ContinentSummary {
                continent: continent.to_string(),
                count,
                mean_population: total / count as u64,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.continent.cmp(&b.continent)));
        out
    }
}
