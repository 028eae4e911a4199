//! Plan persistence - the round-trip state shape of an editor session
//!
//! Only dates, lanes and grid dimensions are stored. Pixel geometry is
//! recomputed from them on load.

use crate::config::EditorConfig;
use crate::core::{DayUnit, Grid, IdCounter, ItemId, Link, LinkId, ScheduleItem};
use crate::editor::Editor;
use crate::errors::{GanttError, InvalidOperation};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Persisted editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    pub grid: GridRecord,
    pub id_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    pub lane: usize,
    pub start_date: NaiveDate,
    pub duration_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub id: LinkId,
    pub origin_id: Option<ItemId>,
    pub end_id: Option<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRecord {
    pub lane_count: usize,
    pub day_count: usize,
    #[serde(default)]
    pub day_unit: DayUnit,
    pub origin_date: NaiveDate,
}

impl PlanState {
    /// Snapshot the committed state of `editor`
    pub fn capture(editor: &Editor) -> Self {
        let grid = editor.grid();
        Self {
            items: editor
                .items()
                .map(|item| ItemRecord {
                    id: item.id,
                    lane: item.lane,
                    start_date: item.start,
                    duration_days: item.duration_days,
                })
                .collect(),
            links: editor
                .graph()
                .links()
                .map(|link| LinkRecord {
                    id: link.id,
                    origin_id: link.origin,
                    end_id: link.end,
                })
                .collect(),
            grid: GridRecord {
                lane_count: grid.lane_count,
                day_count: grid.day_count,
                day_unit: grid.day_unit,
                origin_date: grid.origin,
            },
            id_counter: editor.id_counter().peek(),
        }
    }

    /// Rebuild an editor. Pixel sizes come from `config`; the whole plan is
    /// rejected if any record breaks an invariant.
    pub fn restore(&self, config: &EditorConfig) -> crate::Result<Editor> {
        if self.grid.lane_count == 0 || self.grid.day_count == 0 {
            return Err(GanttError::InvalidPlan(
                "grid must have at least one lane and one day".to_string(),
            ));
        }

        // items and links draw from one counter, so every id is unique
        let mut seen = BTreeSet::new();
        let ids = self
            .items
            .iter()
            .map(|item| item.id.0)
            .chain(self.links.iter().map(|link| link.id.0));
        for id in ids {
            if !seen.insert(id) {
                return Err(GanttError::InvalidPlan(format!(
                    "id {} is used more than once",
                    id
                )));
            }
        }
        if let Some(&highest) = seen.last() {
            if highest >= self.id_counter {
                return Err(GanttError::InvalidPlan(format!(
                    "idCounter {} does not exceed stored id {}",
                    self.id_counter, highest
                )));
            }
        }

        let grid = Grid {
            lane_count: self.grid.lane_count,
            day_count: self.grid.day_count,
            day_unit: self.grid.day_unit,
            origin: self.grid.origin_date,
            lane_height: config.grid.lane_height,
            unit_width: config.grid.unit_width,
        };

        let mut editor = Editor::with_grid(config, grid);
        for record in &self.items {
            editor
                .restore_item(ScheduleItem::new(
                    record.id,
                    record.lane,
                    record.start_date,
                    record.duration_days,
                ))
                .map_err(|err| match err {
                    err @ GanttError::InvalidOperation(InvalidOperation::DateOutOfRange { .. }) => {
                        GanttError::InvalidPlan(format!("{}: {}", record.id, err))
                    }
                    other => other,
                })?;
        }
        for record in &self.links {
            let link = Link {
                id: record.id,
                origin: record.origin_id,
                end: record.end_id,
            };
            editor.restore_link(&link).map_err(|err| match err {
                GanttError::ItemNotFound(item) => {
                    GanttError::InvalidPlan(format!("{} references missing {}", record.id, item))
                }
                other => other,
            })?;
        }
        editor.restore_id_counter(IdCounter::starting_at(self.id_counter));

        log::info!(
            "restored plan: {} items, {} links",
            self.items.len(),
            self.links.len()
        );
        Ok(editor)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save plan to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, self.to_json()?)?;
        log::debug!("saved plan to {}", path.display());
        Ok(())
    }

    /// Load plan from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
