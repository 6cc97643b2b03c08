use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::assemble::MoFreakFeature;
use crate::errors::{ExtractionError, Result};

/// Serializes a per-video feature stream to the MoFREAK text format.
///
/// One whitespace-separated record per line, in accumulation order:
/// `frame x y scale appearance.. motion.. action person video_number`.
/// The destination is created or fully rewritten, so flushing the same
/// unmodified stream twice produces byte-identical files.
pub fn write_features(features: &[MoFreakFeature], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| ExtractionError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut write_all = || -> std::io::Result<()> {
        for feature in features {
            write!(
                writer,
                "{} {} {} {}",
                feature.frame_number, feature.x, feature.y, feature.scale
            )?;
            for byte in &feature.appearance {
                write!(writer, " {byte}")?;
            }
            for byte in &feature.motion {
                write!(writer, " {byte}")?;
            }
            writeln!(
                writer,
                " {} {} {}",
                feature.action, feature.person, feature.video_number
            )?;
        }
        writer.flush()
    };

    write_all().map_err(|source| ExtractionError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;

    info!("wrote {} features to {}", features.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feature() -> MoFreakFeature {
        MoFreakFeature {
            frame_number: 4,
            x: 12.5,
            y: 33.0,
            scale: 9.0,
            appearance: vec![1, 2, 3, 4, 5, 6, 7, 8],
            motion: vec![255, 0, 128, 64, 32, 16, 8, 4],
            action: 2,
            person: 11,
            video_number: 3,
            motion_x: 0,
            motion_y: 0,
        }
    }

    #[test]
    fn record_layout_matches_the_mofreak_format() {
        let dir = std::env::temp_dir().join("mofreak-io-layout");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("single.mofreak");

        write_features(&[sample_feature()], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "4 12.5 33 9 1 2 3 4 5 6 7 8 255 0 128 64 32 16 8 4 2 11 3\n"
        );
    }

    #[test]
    fn flush_is_idempotent() {
        let dir = std::env::temp_dir().join("mofreak-io-idempotent");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("twice.mofreak");

        let features = vec![sample_feature(), sample_feature()];
        write_features(&features, &path).unwrap();
        let first = std::fs::read(&path).unwrap();
        write_features(&features, &path).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_stream_truncates_the_destination() {
        let dir = std::env::temp_dir().join("mofreak-io-truncate");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.mofreak");

        write_features(&[sample_feature()], &path).unwrap();
        write_features(&[], &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let path = Path::new("/nonexistent-mofreak-dir/out.mofreak");
        let err = write_features(&[sample_feature()], path).unwrap_err();
        assert!(matches!(err, ExtractionError::Persistence { .. }));
    }
}
