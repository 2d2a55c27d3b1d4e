use ndarray_rand::rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use serde::Serialize;
use tempdir::TempDir;

use bradford::calibration::{self, StandardPoint};
use bradford::config::Config;
use bradford::resolve::{self, DilutionTarget, SampleMeasurement};
use bradford::{pipeline, Error, Result};

#[derive(Serialize)]
struct Row {
    #[serde(rename = "Well")]
    well: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "Sample Name")]
    sample_name: String,
    #[serde(rename = "Average based on Blank corrected (595)")]
    absorbance: f64,
}

fn create_data_dir(test_name: &str) -> Result<TempDir> {
    Ok(TempDir::new(test_name)?)
}

fn write_plate(
    working_dir: &TempDir,
    file_name: &str,
    standards: &[(f64, f64)],
    samples: &[(&str, f64)],
) -> Result<()> {
    let config = Config::default();
    let mut wtr = csv::Writer::from_path(working_dir.path().join(file_name))?;
    for (ii, (concentration, absorbance)) in standards.iter().enumerate() {
        let label = config
            .standards
            .iter()
            .find(|s| (s.concentration - concentration).abs() < f64::EPSILON)
            .map(|s| s.label.clone())
            .expect("standard concentration missing from ladder");
        wtr.serialize(Row {
            well: format!("A{}", ii + 1),
            content: label,
            sample_name: String::new(),
            absorbance: *absorbance,
        })?;
    }
    for (ii, (name, absorbance)) in samples.iter().enumerate() {
        wtr.serialize(Row {
            well: format!("B{}", ii + 1),
            content: format!("Sample X{}", ii + 1),
            sample_name: (*name).to_owned(),
            absorbance: *absorbance,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

const BRADFORD_STANDARDS: [(f64, f64); 5] = [
    (1.5, 0.40),
    (1.0, 0.28),
    (0.75, 0.20),
    (0.5, 0.14),
    (0.25, 0.07),
];

#[test]
fn bradford_plate_resolves_to_the_expected_recipe() -> Result<()> {
    let standards = BRADFORD_STANDARDS
        .iter()
        .enumerate()
        .map(|(ii, (c, a))| StandardPoint::new(format!("Standard S{}", ii + 1), *c, *a))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let model = calibration::fit(&standards)?;

    approx::assert_relative_eq!(model.slope(), 0.2455 / 0.925, max_relative = 1e-12);
    approx::assert_relative_eq!(model.intercept(), 0.005_675_675_675, max_relative = 1e-9);
    approx::assert_relative_eq!(model.r_squared(), 0.998_116_222_84, max_relative = 1e-9);
    approx::assert_relative_eq!(model.valid_range().min(), 0.25);
    approx::assert_relative_eq!(model.valid_range().max(), 1.5);

    let samples = [SampleMeasurement::new("lysate", 0.20, 0)];
    let target = DilutionTarget {
        target_diluted_volume_ul: 10.0,
        target_total_volume_ul: 11.25,
    };
    let result = resolve::resolve(&model, &samples, 2.0, &target)
        .pop()
        .expect("one result per sample")
        .expect("sample resolves");

    approx::assert_relative_eq!(result.concentration(), 0.732_179_226, max_relative = 1e-8);
    assert!(result.in_range());
    approx::assert_relative_eq!(
        result.diluted_concentration(),
        1.464_358_452,
        max_relative = 1e-8
    );
    approx::assert_relative_eq!(result.sample_volume_ul(), 6.828_929_068, max_relative = 1e-8);
    approx::assert_relative_eq!(result.water_volume_ul(), 4.421_070_932, max_relative = 1e-8);
    assert!(result.is_feasible());

    Ok(())
}

#[test]
fn generated_plates_recover_their_sample_concentrations() -> Result<()> {
    let seed = 40;
    let mut rng = Isaac64Rng::seed_from_u64(seed);

    // Arrange
    let tmp_dir = create_data_dir("generated_plates_recover_their_sample_concentrations")?;
    let slope: f64 = rng.gen_range(0.1..0.5);
    let intercept: f64 = rng.gen_range(-0.02..0.02);
    let standards = Config::default()
        .standards
        .iter()
        .map(|s| (s.concentration, slope * s.concentration + intercept))
        .collect::<Vec<_>>();

    let num_samples = rng.gen_range(1..24);
    let concentrations = (0..num_samples)
        .map(|_| rng.gen_range(0.25..1.5))
        .collect::<Vec<f64>>();
    let names = (0..num_samples)
        .map(|ii| format!("sample {ii}"))
        .collect::<Vec<_>>();
    let samples = names
        .iter()
        .zip(&concentrations)
        .map(|(name, c)| (name.as_str(), slope * c + intercept))
        .collect::<Vec<_>>();

    write_plate(&tmp_dir, "lysate_1zu5.csv", &standards, &samples)?;

    // Act
    let analysis =
        pipeline::analyse_file(&tmp_dir.path().join("lysate_1zu5.csv"), &Config::default())?;

    // Assert
    approx::assert_relative_eq!(analysis.dilution_factor, 5.0);
    approx::assert_relative_eq!(analysis.model.slope(), slope, max_relative = 1e-9);
    assert_eq!(analysis.results.len(), num_samples);

    for ((name, expected), resolution) in names
        .iter()
        .zip(&concentrations)
        .zip(&analysis.results)
    {
        let result = resolution.as_ref().expect("every sample resolves");
        assert_eq!(result.sample().name(), name.as_str());
        assert!(result.in_range());
        approx::assert_relative_eq!(result.concentration(), *expected, max_relative = 1e-9);
        approx::assert_relative_eq!(
            result.diluted_concentration(),
            5.0 * expected,
            max_relative = 1e-9
        );
    }

    Ok(())
}

#[test]
fn a_failed_plate_does_not_stop_the_batch() -> Result<()> {
    let tmp_dir = create_data_dir("a_failed_plate_does_not_stop_the_batch")?;

    write_plate(
        &tmp_dir,
        "b_lysate_1zu2.csv",
        &BRADFORD_STANDARDS,
        &[("kidney", 0.2), ("liver", 0.28)],
    )?;
    // A single standard cannot calibrate the plate
    write_plate(&tmp_dir, "a_lysate.csv", &[(1.5, 0.4)], &[("heart", 0.2)])?;
    std::fs::write(tmp_dir.path().join("notes.txt"), "not a plate")?;

    let analyses = pipeline::analyse_directory(tmp_dir.path(), &Config::default())?;

    assert_eq!(analyses.len(), 2);

    let (path, failed) = &analyses[0];
    assert!(path.ends_with("a_lysate.csv"));
    let error = failed.as_ref().expect_err("single standard plate must fail");
    assert_eq!(
        error.downcast_ref::<Error>(),
        Some(&Error::InsufficientCalibrationData { distinct: 1 })
    );

    let (path, analysis) = &analyses[1];
    assert!(path.ends_with("b_lysate_1zu2.csv"));
    let analysis = analysis.as_ref().expect("complete plate must succeed");
    approx::assert_relative_eq!(analysis.dilution_factor, 2.0);
    assert_eq!(analysis.results.len(), 2);
    assert!(analysis.results.iter().all(std::result::Result::is_ok));

    Ok(())
}
