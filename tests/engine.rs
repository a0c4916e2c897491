//! End-to-end properties of the probability engine, exercised through the
//! public API only.

use u_probability::discrete::GeometricForm;
use u_probability::transform::TransformKind;
use u_probability::{
    evaluate, mgf, moments, probability_table, simulate, transform, DistributionSpec, Family,
    Operation, ProbabilityError, SimulationMode, SimulationRequest, SpecParams, TableOptions,
    TargetFamily, Transform,
};

fn discrete_specs() -> Vec<DistributionSpec> {
    vec![
        DistributionSpec::bernoulli(0.37).unwrap(),
        DistributionSpec::binomial(30.0, 0.2).unwrap(),
        DistributionSpec::geometric(0.15, GeometricForm::Trials).unwrap(),
        DistributionSpec::geometric(0.4, GeometricForm::Failures).unwrap(),
        DistributionSpec::poisson(7.5).unwrap(),
        DistributionSpec::negative_binomial(4.0, 0.35).unwrap(),
        DistributionSpec::hypergeometric(60.0, 25.0, 12.0).unwrap(),
    ]
}

#[test]
fn pmf_sums_to_one_over_table() {
    let options = TableOptions {
        mass_threshold: 1.0 - 1e-9,
        max_points: 10_000,
        ..TableOptions::default()
    };
    for spec in discrete_specs() {
        let table = probability_table(&spec, &options).unwrap();
        let total: f64 = table.iter().map(|p| p.pmf_or_pdf).sum();
        assert!((total - 1.0).abs() < 1e-6, "{spec}: total {total}");
    }
}

#[test]
fn cdf_is_running_sum_of_pmf() {
    for spec in discrete_specs() {
        let (lo, _) = spec.support();
        let mut running = 0.0;
        for k in (lo as i64)..(lo as i64 + 40) {
            running += spec.pmf_or_pdf(k as f64);
            let cdf = evaluate(&spec, Operation::Cdf, Some(k as f64)).unwrap();
            assert!((cdf - running.min(1.0)).abs() < 1e-9, "{spec} at {k}");
        }
    }
}

#[test]
fn poisson_mean_equals_variance() {
    for lambda in [0.01, 0.5, 3.0, 42.0, 1000.0] {
        let spec = DistributionSpec::poisson(lambda).unwrap();
        assert_eq!(evaluate(&spec, Operation::Mean, None).unwrap(), lambda);
        assert_eq!(evaluate(&spec, Operation::Variance, None).unwrap(), lambda);
    }
}

#[test]
fn binomial_reference_values() {
    let spec = DistributionSpec::binomial(10.0, 0.3).unwrap();
    assert!((evaluate(&spec, Operation::Mean, None).unwrap() - 3.0).abs() < 1e-12);
    assert!((evaluate(&spec, Operation::Variance, None).unwrap() - 2.1).abs() < 1e-12);
}

#[test]
fn fair_bernoulli() {
    let spec = DistributionSpec::bernoulli(0.5).unwrap();
    assert!((evaluate(&spec, Operation::Pmf, Some(0.0)).unwrap() - 0.5).abs() < 1e-15);
    assert!((evaluate(&spec, Operation::Pmf, Some(1.0)).unwrap() - 0.5).abs() < 1e-15);
    assert_eq!(evaluate(&spec, Operation::Variance, None).unwrap(), 0.25);
    for p in [0.1, 0.3, 0.49, 0.51, 0.9] {
        let other = DistributionSpec::bernoulli(p).unwrap();
        assert!(other.variance() < 0.25);
    }
}

#[test]
fn geometric_trials_reference_values() {
    let spec = DistributionSpec::geometric(0.2, GeometricForm::Trials).unwrap();
    assert!((spec.mean() - 5.0).abs() < 1e-12);
    assert!((spec.variance() - 20.0).abs() < 1e-12);
    let failures = DistributionSpec::geometric(0.2, GeometricForm::Failures).unwrap();
    assert!((failures.mean() - 4.0).abs() < 1e-12);
    assert!((failures.variance() - 20.0).abs() < 1e-12);
}

#[test]
fn normal_identity_transform_round_trips() {
    let source = DistributionSpec::normal(-3.5, 0.75).unwrap();
    let result = transform(&source, Transform::Linear { a: 1.0, b: 0.0 }).unwrap();
    assert_eq!(result.rule, TransformKind::Linear);
    assert_eq!(result.target, TargetFamily::Distribution(source));
    assert_eq!(result.target.params(), source.params().values());
}

#[test]
fn exponential_law_of_large_numbers() {
    let spec = DistributionSpec::exponential(2.0).unwrap();
    let run = simulate(&spec, 100_000, Some(2024), SimulationMode::Statistics).unwrap();
    assert!((run.summary.mean - 0.5).abs() < 0.02);
}

#[test]
fn simulation_is_deterministic() {
    for spec in discrete_specs()
        .into_iter()
        .chain([DistributionSpec::normal(0.0, 1.0).unwrap()])
    {
        let a = simulate(&spec, 500, Some(77), SimulationMode::Statistics).unwrap();
        let b = simulate(&spec, 500, Some(77), SimulationMode::Convergence).unwrap();
        assert_eq!(a.samples, b.samples, "{spec}");
    }
}

#[test]
fn error_scenarios() {
    assert!(matches!(
        DistributionSpec::binomial(-1.0, 0.5),
        Err(ProbabilityError::Validation(_))
    ));

    let exponential = DistributionSpec::exponential(1.0).unwrap();
    assert!(matches!(mgf(&exponential, 2.0), Err(ProbabilityError::Domain(_))));
    assert!(matches!(
        moments(&exponential, 2, Some(2.0)),
        Err(ProbabilityError::Domain(_))
    ));

    assert!(matches!(
        simulate(&exponential, 50, Some(1), SimulationMode::Statistics),
        Err(ProbabilityError::Validation(_))
    ));

    assert!(matches!(
        transform(&exponential, Transform::Linear { a: -1.0, b: 0.0 }),
        Err(ProbabilityError::InvalidTransform(_))
    ));

    let normal = DistributionSpec::normal(0.0, 1.0).unwrap();
    assert!(matches!(
        transform(&normal, Transform::Max { n: 3 }),
        Err(ProbabilityError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        "lognormal".parse::<Family>(),
        Err(ProbabilityError::Validation(_))
    ));
    assert!(matches!(
        "bootstrap".parse::<SimulationMode>(),
        Err(ProbabilityError::Validation(_))
    ));
}

#[test]
fn moment_set_invariants() {
    let specs = discrete_specs().into_iter().chain([
        DistributionSpec::uniform(-1.0, 2.0).unwrap(),
        DistributionSpec::normal(2.0, 3.0).unwrap(),
        DistributionSpec::exponential(0.5).unwrap(),
        DistributionSpec::gamma(2.5, 1.5).unwrap(),
    ]);
    for spec in specs {
        let set = moments(&spec, 4, None).unwrap();
        assert_eq!(set.central[0], 0.0, "{spec}");
        assert!((set.standardized[1] - 1.0).abs() < 1e-9, "{spec}");
        assert!((set.raw[0] - spec.mean()).abs() < 1e-9 * spec.mean().abs().max(1.0));
        assert!((set.central[1] - spec.variance()).abs() < 1e-9 * spec.variance().max(1.0));
        let skew = spec.skewness().unwrap();
        let kurt = spec.kurtosis().unwrap();
        assert!((set.skewness().unwrap() - skew).abs() < 1e-9, "{spec}");
        assert!((set.kurtosis().unwrap() - kurt).abs() < 1e-9, "{spec}");
    }
}

#[test]
fn spec_deserializes_from_json() {
    let spec: DistributionSpec =
        serde_json::from_str(r#"{"family":"negativeBinomial","r":3,"p":0.25}"#).unwrap();
    assert_eq!(spec, DistributionSpec::negative_binomial(3.0, 0.25).unwrap());

    let spec: DistributionSpec =
        serde_json::from_str(r#"{"family":"geometric","p":0.5,"form":"failures"}"#).unwrap();
    assert_eq!(spec.mean(), 1.0);

    let formless = serde_json::from_str::<DistributionSpec>(r#"{"family":"geometric","p":0.5}"#);
    assert!(formless.unwrap_err().to_string().contains("form"));

    let invalid = serde_json::from_str::<DistributionSpec>(r#"{"family":"binomial","n":-1,"p":0.5}"#);
    assert!(invalid.is_err());

    let params: SpecParams = serde_json::from_str(r#"{"family":"gamma","shape":2.0,"rate":0.5}"#).unwrap();
    assert_eq!(
        DistributionSpec::try_from(params).unwrap().family(),
        Family::Gamma
    );
}

#[test]
fn transform_and_request_deserialize() {
    let t: Transform = serde_json::from_str(r#"{"rule":"linear","a":2.0,"b":1.0}"#).unwrap();
    assert_eq!(t, Transform::Linear { a: 2.0, b: 1.0 });
    let t: Transform = serde_json::from_str(r#"{"rule":"min","n":4}"#).unwrap();
    assert_eq!(t, Transform::Min { n: 4 });

    let request: SimulationRequest = serde_json::from_str(
        r#"{"spec":{"family":"bernoulli","p":0.5},"sampleSize":1000,"seed":5,"simulationType":"convergence"}"#,
    )
    .unwrap();
    let run = request.run().unwrap();
    assert_eq!(run.mode, SimulationMode::Convergence);
    assert_eq!(run.samples.len(), 1000);

    let unknown = serde_json::from_str::<SimulationRequest>(
        r#"{"spec":{"family":"bernoulli","p":0.5},"sampleSize":1000,"simulationType":"bootstrap"}"#,
    );
    assert!(unknown
        .unwrap_err()
        .to_string()
        .contains("unknown simulation type 'bootstrap'"));

    let untyped = serde_json::from_str::<SimulationRequest>(
        r#"{"spec":{"family":"bernoulli","p":0.5},"sampleSize":1000}"#,
    );
    assert!(untyped.is_err());
}

#[test]
fn results_serialize() {
    let spec = DistributionSpec::poisson(2.0).unwrap();
    let set = moments(&spec, 3, Some(0.1)).unwrap();
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["order"], 3);
    assert_eq!(json["central"][0], 0.0);

    let table = probability_table(&spec, &TableOptions::default()).unwrap();
    let json = serde_json::to_value(&table[0]).unwrap();
    assert!(json.get("pmfOrPdf").is_some());

    let spec_json = serde_json::to_value(spec).unwrap();
    assert_eq!(spec_json["family"], "poisson");
    assert_eq!(spec_json["lambda"], 2.0);
}
