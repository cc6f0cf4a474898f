use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use churn_ml::models::network::NetworkConfig;
use churn_ml::{ChurnNetwork, PipelineError, Solver, SolverConfig};

const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,MultipleLines,\
InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,TechSupport,StreamingTV,StreamingMovies,\
Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn";

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];
const PAYMENT: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Набор в формате Telco: каждая `blank_every`-я строка без TotalCharges
fn telco_csv(n_rows: usize, blank_every: usize) -> String {
    let mut csv = format!("{}\n", HEADER);
    for i in 0..n_rows {
        let contract = i % 3;
        let tenure = 1 + (i * 7) % 24;
        let monthly = 20.0 + ((i * 13) % 80) as f64 + 0.35;
        let total = if i % blank_every == 0 {
            " ".to_string()
        } else {
            format!("{:.2}", monthly * tenure as f64)
        };
        // Отток в основном у помесячных договоров
        let churn = (contract == 0 && i % 4 != 1) || i % 11 == 0;

        let _ = writeln!(
            csv,
            "{id:04}-ABCDE,{gender},{senior},{partner},{dep},{tenure},{phone},{lines},{internet},\
             {sec},{backup},{prot},{tech},{tv},{movies},{contract},{paperless},\"{payment}\",{monthly:.2},{total},{churn}",
            id = i,
            gender = if i % 2 == 0 { "Female" } else { "Male" },
            senior = u8::from(i % 5 == 0),
            partner = yes_no(i % 3 == 1),
            dep = yes_no(i % 4 == 2),
            tenure = tenure,
            phone = yes_no(i % 6 != 0),
            lines = if i % 6 == 0 { "No phone service" } else { yes_no(i % 2 == 1) },
            internet = INTERNET[i % 3],
            sec = yes_no(i % 5 == 1),
            backup = yes_no(i % 7 == 3),
            prot = yes_no(i % 3 == 2),
            tech = yes_no(i % 8 < 3),
            tv = yes_no(i % 2 == 0),
            movies = yes_no(i % 9 < 4),
            contract = CONTRACTS[contract],
            paperless = yes_no(i % 3 != 2),
            payment = PAYMENT[i % 4],
            monthly = monthly,
            total = total,
            churn = yes_no(churn),
        );
    }
    csv
}

fn write_dataset(dir: &Path, contents: &str) {
    fs::write(dir.join("Telco-Customer-Churn.csv"), contents).unwrap();
}

fn quick_config(dir: &Path, impute_nan: bool) -> SolverConfig {
    let mut config = SolverConfig::new(dir, "Telco-Customer-Churn.csv", "/output/", "output.csv")
        .with_impute_nan(impute_nan);
    config.network = NetworkConfig {
        epochs: 3,
        batch_size: 32,
        ..NetworkConfig::default()
    };
    config
}

#[test]
fn test_full_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &telco_csv(200, 25));

    let config = quick_config(dir.path(), true);
    let output_dir = config.output_dir();
    let summary = Solver::new(config).unwrap().exec().unwrap();

    assert_eq!(summary.n_rows, 200);
    assert_eq!(summary.history.epochs(), 3);
    assert_eq!(summary.history.val_accuracy.len(), 3);
    assert!(!summary.feature_names.iter().any(|f| f == "churn"));
    assert!(summary.feature_names.contains(&"contract_month-to-month".to_string()));
    assert!(summary
        .feature_names
        .contains(&"paymentmethod_bank_transfer_automatic".to_string()));

    assert!((0.0..=1.0).contains(&summary.evaluation.accuracy));
    assert!((0.0..=1.0).contains(&summary.report.auc));
    assert!((0.0..=1.0).contains(&summary.baseline_accuracy));
    assert_eq!(summary.report.per_class.support.iter().sum::<usize>(), 40);

    for path in [
        &summary.artifacts.graph,
        &summary.artifacts.accuracy_chart,
        &summary.artifacts.loss_chart,
        &summary.artifacts.model,
        &summary.artifacts.predictions,
    ] {
        assert!(path.starts_with(&output_dir), "{} outside output dir", path.display());
        assert!(path.is_file(), "{} missing", path.display());
    }

    // Заголовок + ceil(0.2 * 200) тестовых строк
    let predictions = fs::read_to_string(&summary.artifacts.predictions).unwrap();
    assert_eq!(predictions.lines().count(), 41);

    let network = ChurnNetwork::load(&summary.artifacts.model).unwrap();
    assert_eq!(network.input_dim(), summary.feature_names.len());
}

#[test]
fn test_drop_policy_removes_blank_charges() {
    let dir = tempfile::tempdir().unwrap();
    // строки 0, 20, ..., 180 без TotalCharges
    write_dataset(dir.path(), &telco_csv(200, 20));

    let summary = Solver::new(quick_config(dir.path(), false)).unwrap().exec().unwrap();
    assert_eq!(summary.n_rows, 190);
    // ceil(0.2 * 190) = 38
    assert_eq!(summary.report.per_class.support.iter().sum::<usize>(), 38);
}

#[test]
fn test_runs_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &telco_csv(120, 30));

    let first = Solver::new(quick_config(dir.path(), true)).unwrap().exec().unwrap();
    let second = Solver::new(quick_config(dir.path(), true)).unwrap().exec().unwrap();
    assert_eq!(first.history, second.history);
    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.baseline_accuracy, second.baseline_accuracy);
}

#[test]
fn test_unknown_target_label_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = telco_csv(60, 30);
    let mut lines: Vec<String> = csv.lines().map(str::to_string).collect();
    let last = lines.len() - 1;
    let cut = lines[last].rfind(',').unwrap();
    lines[last] = format!("{},Maybe", &lines[last][..cut]);
    write_dataset(dir.path(), &lines.join("\n"));

    let err = Solver::new(quick_config(dir.path(), true)).unwrap().exec().unwrap_err();
    assert!(matches!(err, PipelineError::Domain { ref column, .. } if column == "churn"));
}

#[test]
fn test_missing_input_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Solver::new(quick_config(dir.path(), true)).err().unwrap();
    assert!(matches!(err, PipelineError::Io { .. }));
}
