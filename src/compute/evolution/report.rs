//! Report writer: JSON and CSV exports of timetables and search results.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compute::{EnergyDistribution, EnergySimulator, Timetable};
use crate::schema::{
    EvolutionHistory, IndividualSnapshot, RandomWalkResult, ReuseRule, ScheduleParams,
};

/// Writes report files into one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create the writer, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let output_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write(&self, name: &str, contents: String) -> io::Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::write(&path, contents)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Missions, stations and intervals as pretty JSON.
    pub fn write_timetable(&self, name: &str, timetable: &Timetable) -> io::Result<PathBuf> {
        let json = serde_json::to_string_pretty(timetable)?;
        self.write(name, json)
    }

    /// One line per mission: `station,time` pairs at every arrival and
    /// departure.
    pub fn write_plot_data(&self, name: &str, timetable: &Timetable) -> io::Result<PathBuf> {
        let mut out = String::new();
        for points in timetable.plot_data() {
            let line: Vec<String> = points
                .iter()
                .map(|(station, time)| format!("{station},{time}"))
                .collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        self.write(name, out)
    }

    /// One file per arm and series: `{prefix}-consume-arm-{id}.csv` and
    /// `{prefix}-produce-arm-{id}.csv`, one value per second.
    pub fn write_energy_distribution(
        &self,
        prefix: &str,
        distribution: &EnergyDistribution,
    ) -> io::Result<Vec<PathBuf>> {
        let series = distribution
            .consume
            .iter()
            .map(|(arm, values)| ("consume", arm, values))
            .chain(
                distribution
                    .produce
                    .iter()
                    .map(|(arm, values)| ("produce", arm, values)),
            );

        let mut paths = Vec::new();
        for (kind, arm, values) in series {
            let mut out = String::with_capacity(values.len() * 8);
            for v in values {
                // Writing into a String cannot fail.
                let _ = writeln!(out, "{v}");
            }
            paths.push(self.write(&format!("{prefix}-{kind}-arm-{arm}.csv"), out)?);
        }
        Ok(paths)
    }

    /// `generation,best_fitness,worst_fitness,avg_fitness` per generation.
    pub fn write_history(&self, name: &str, history: &EvolutionHistory) -> io::Result<PathBuf> {
        let mut out = String::from("generation,best_fitness,worst_fitness,avg_fitness\n");
        for g in &history.generations {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                g.generation, g.best_fitness, g.worst_fitness, g.avg_fitness
            );
        }
        self.write(name, out)
    }

    /// One line per walker with its fitness trace.
    pub fn write_random_walk(&self, name: &str, result: &RandomWalkResult) -> io::Result<PathBuf> {
        let mut out = String::new();
        for trace in &result.traces {
            let line: Vec<String> = trace.iter().map(f64::to_string).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        self.write(name, out)
    }

    /// Snapshot as pretty JSON.
    pub fn write_snapshot(&self, name: &str, snapshot: &IndividualSnapshot) -> io::Result<PathBuf> {
        let json = serde_json::to_string_pretty(snapshot)?;
        self.write(name, json)
    }

    /// Every export of one solution under `label`: snapshot, decoded
    /// timetable, plot data and energy series.
    pub fn write_solution(
        &self,
        label: &str,
        snapshot: &IndividualSnapshot,
        params: &ScheduleParams,
        rule: ReuseRule,
    ) -> io::Result<Vec<PathBuf>> {
        snapshot
            .config
            .validate(params)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let timetable = Timetable::decode(&snapshot.config, params);
        let distribution = EnergySimulator::new(params, rule).distribution(&timetable);

        let mut paths = vec![
            self.write_snapshot(&format!("{label}-config.json"), snapshot)?,
            self.write_timetable(&format!("{label}-timetable.json"), &timetable)?,
            self.write_plot_data(&format!("{label}-plot.csv"), &timetable)?,
        ];
        paths.extend(self.write_energy_distribution(label, &distribution)?);
        log::info!(
            "Saved {} report files for '{}' to {}",
            paths.len(),
            label,
            self.output_dir.display()
        );
        Ok(paths)
    }
}
