//! Pipelines command implementation.

use catsync_engine::PipelineName;

/// Lists every named pipeline with its source and target.
pub fn run() {
    println!("Available pipelines:");
    for pipeline in PipelineName::ALL {
        println!(
            "  {:<26} {} -> {}",
            pipeline.as_str(),
            pipeline.source(),
            pipeline.target()
        );
    }
}
