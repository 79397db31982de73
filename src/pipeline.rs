//! End-to-end analysis: load, encode, fit, explain, plot

use crate::config::AnalysisConfig;
use crate::error::{BikeTreeError, Result};
use crate::explainability::FeatureImportances;
use crate::preprocessing::FeatureTable;
use crate::training::{DecisionTreeRegressor, RegressionMetrics};
use crate::utils::data_loader::DataLoader;
use crate::visualization::{BarChart, SvgDocument, TreePlot};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Summary of a completed analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Observations used for fitting
    pub n_rows: usize,
    /// Columns of the encoded feature table
    pub feature_names: Vec<String>,
    /// Split levels of the fitted tree
    pub tree_depth: usize,
    pub n_leaves: usize,
    /// Fit quality on the training data
    pub metrics: RegressionMetrics,
    pub importances: FeatureImportances,
    pub tree_plot_path: PathBuf,
    pub importance_plot_path: PathBuf,
    pub elapsed_secs: f64,
}

/// Fitted state produced before any plot is written
#[derive(Debug, Clone)]
pub struct FittedAnalysis {
    pub table: FeatureTable,
    pub tree: DecisionTreeRegressor,
    pub importances: FeatureImportances,
    pub metrics: RegressionMetrics,
}

/// The bike-rental tree analysis
pub struct Analysis {
    config: AnalysisConfig,
    loader: DataLoader,
}

impl Analysis {
    /// Create an analysis from a validated configuration
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader: DataLoader::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage, reading the configured CSV
    pub fn run(&self) -> Result<AnalysisReport> {
        let _span =
            tracing::info_span!("analysis", data = %self.config.data_path.display()).entered();

        let df = self.loader.load_csv(&self.config.data_path)?;
        tracing::info!(rows = df.height(), cols = df.width(), "loaded dataset");

        self.run_on_frame(&df)
    }

    /// Run every stage on an already loaded table
    pub fn run_on_frame(&self, df: &DataFrame) -> Result<AnalysisReport> {
        let start = Instant::now();

        let fitted = self.fit(df)?;

        // Both documents are rendered before anything touches the disk
        let tree_doc = self.render_tree(&fitted)?;
        let importance_doc = self.render_importances(&fitted.importances)?;

        let tree_plot_path = self.config.tree_plot_path();
        let importance_plot_path = self.config.importance_plot_path();
        if !self.config.output_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.config.output_dir)?;
        }

        write_plot(&tree_doc, &tree_plot_path)?;
        write_plot(&importance_doc, &importance_plot_path)?;

        let report = AnalysisReport {
            n_rows: fitted.table.n_rows(),
            feature_names: fitted.table.feature_names.clone(),
            tree_depth: fitted.tree.depth(),
            n_leaves: fitted.tree.n_leaves(),
            metrics: fitted.metrics,
            importances: fitted.importances,
            tree_plot_path,
            importance_plot_path,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(elapsed = ?start.elapsed(), "analysis complete");
        Ok(report)
    }

    /// Encode the table, fit the tree and compute importances
    pub fn fit(&self, df: &DataFrame) -> Result<FittedAnalysis> {
        let table = {
            let _span = tracing::debug_span!("encode").entered();
            FeatureTable::build(df, &self.config)?
        };

        let mut tree = DecisionTreeRegressor::from_config(&self.config.tree);
        {
            let _span =
                tracing::debug_span!("fit", max_depth = ?self.config.tree.max_depth).entered();
            tree.fit(&table.x, &table.y)?;
        }

        let metrics = tree.metrics(&table.x, &table.y)?;
        tracing::info!(
            depth = tree.depth(),
            leaves = tree.n_leaves(),
            r2 = metrics.r2,
            rmse = metrics.rmse,
            "fitted decision tree"
        );

        let importances = FeatureImportances::from_model(&tree, &table.feature_names)?;
        for entry in importances.non_zero() {
            tracing::debug!(
                feature = %entry.feature_name,
                importance = entry.importance,
                "feature importance"
            );
        }

        Ok(FittedAnalysis {
            table,
            tree,
            importances,
            metrics,
        })
    }

    fn render_tree(&self, fitted: &FittedAnalysis) -> Result<SvgDocument> {
        TreePlot::new().render(&fitted.tree, &fitted.table.feature_names)
    }

    fn render_importances(&self, importances: &FeatureImportances) -> Result<SvgDocument> {
        BarChart::new()
            .with_title("Feature importance")
            .render(&importances.names(), &importances.values())
    }
}

fn write_plot(doc: &SvgDocument, path: &Path) -> Result<()> {
    doc.save(path)?;

    let size = std::fs::metadata(path)?.len();
    if size == 0 {
        return Err(BikeTreeError::RenderError(format!(
            "{} was written empty",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), bytes = size, "saved plot");
    Ok(())
}
