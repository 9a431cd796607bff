use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use machine_learning::data::Dataset;
use ndarray::{Array1, Array2};

/// Reads a dataset in MNIST CSV format from `path`, see `parse`.
pub fn load(path: &Path, has_header: bool, scale: f32, classes: usize) -> Result<Dataset> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read dataset '{}'", path.display()))?;

    parse(&content, has_header, scale, classes)
        .with_context(|| format!("invalid dataset '{}'", path.display()))
}

/// Parses one sample per line, the label first and then the pixel values.
///
/// Blank lines are skipped and every pixel is divided by `scale`.
pub fn parse(content: &str, has_header: bool, scale: f32, classes: usize) -> Result<Dataset> {
    let mut labels = Vec::new();
    let mut pixels = Vec::new();
    let mut features = None;

    let skip = usize::from(has_header);
    for (i, line) in content.lines().enumerate().skip(skip) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lineno = i + 1;
        let mut fields = line.split(',').map(str::trim);

        let label = fields.next().unwrap_or_default();
        let label: usize = label
            .parse()
            .with_context(|| format!("line {lineno}: cannot parse label '{label}'"))?;

        let before = pixels.len();
        for field in fields {
            let v: f32 = field
                .parse()
                .with_context(|| format!("line {lineno}: cannot parse pixel '{field}'"))?;
            pixels.push(v / scale);
        }

        let count = pixels.len() - before;
        match features {
            None => features = Some(count),
            Some(expected) if expected != count => {
                bail!("line {lineno}: expected {expected} pixels, got {count}")
            }
            Some(_) => {}
        }

        labels.push(label);
    }

    let Some(features) = features else {
        bail!("dataset is empty");
    };

    let images = Array2::from_shape_vec((labels.len(), features), pixels)?;
    Ok(Dataset::new(images, Array1::from(labels), classes)?)
}
