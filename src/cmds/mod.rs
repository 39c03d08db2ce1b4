use std::path::{Path, PathBuf};

pub mod convert;
pub mod generate;
pub mod reduce;
pub mod stats;

fn progress_style_template(msg: Option<&str>) -> indicatif::ProgressStyle {
    match msg {
        Some(msg) => indicatif::ProgressStyle::with_template(
            format!("{msg} [{{elapsed_precise}}] {{spinner:.white}} {{pos:>10}} rows").as_str(),
        )
        .unwrap(),
        None => indicatif::ProgressStyle::with_template(
            "[{elapsed_precise}] {spinner:.cyan/blue} {pos:>10} rows",
        )
        .unwrap(),
    }
}

fn progress_bar(enabled: bool, msg: &str) -> indicatif::ProgressBar {
    if !enabled {
        return indicatif::ProgressBar::hidden();
    }
    let bar = indicatif::ProgressBar::new_spinner();
    bar.set_style(progress_style_template(Some(msg)));
    bar
}

/// `<input>.atf`, the extension is appended rather than replaced.
pub fn atf_output_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(".atf");
    PathBuf::from(path)
}

fn create_output(path: &Path) -> crate::TAResult<std::io::BufWriter<std::fs::File>> {
    Ok(std::io::BufWriter::new(std::fs::File::create(path)?))
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::atf_output_path;

    #[test]
    fn output_path_appends_extension() {
        assert_eq!(
            atf_output_path(Path::new("traces/2016022219-LUN0.csv")),
            Path::new("traces/2016022219-LUN0.csv.atf")
        );
        assert_eq!(atf_output_path(Path::new("lun")), Path::new("lun.atf"));
    }
}
