/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that contains performance metrics
 * to be displayed in the control panel.
 *
 * Includes metrics for:
 * - FPS (frames per second) and frame time
 * - Live molecule and connection counts
 * - Ticks run and frame opportunities skipped by the scheduler
 * - Whether the spatial grid is in use for linking
 */

use std::time::Duration;

use crate::engine::EngineStats;

// Debug information to display
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub stats: EngineStats,
}

impl DebugInfo {
    pub fn record_frame(&mut self, fps: f32, frame_time: Duration, stats: EngineStats) {
        self.fps = fps;
        self.frame_time = frame_time;
        self.stats = stats;
    }

    // Share of frame opportunities that actually ran a tick
    pub fn tick_ratio(&self) -> f32 {
        let total = self.stats.ticks_run + self.stats.ticks_skipped;
        if total == 0 {
            0.0
        } else {
            self.stats.ticks_run as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_ratio_handles_no_frames() {
        assert_eq!(DebugInfo::default().tick_ratio(), 0.0);
    }

    #[test]
    fn record_frame_stores_the_latest_values() {
        let mut info = DebugInfo::default();
        let stats = EngineStats {
            molecules: 120,
            connections: 340,
            ticks_run: 60,
            ticks_skipped: 180,
            using_grid: false,
        };
        info.record_frame(240.0, Duration::from_millis(4), stats);
        assert_eq!(info.stats.connections, 340);
        assert!((info.tick_ratio() - 0.25).abs() < 1e-6);
    }
}
