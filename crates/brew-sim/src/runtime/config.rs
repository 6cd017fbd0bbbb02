use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub tick_ms: u64,
    pub initial_water: Option<i32>,
    pub initial_coffee: Option<i32>,
    pub boiler_on: bool,
    pub valve_open: bool,
    pub carafe_removed: bool,
    pub json_logs: bool,
    pub log_file: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub journal_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            tick_ms: 500,
            initial_water: None,
            initial_coffee: None,
            boiler_on: false,
            valve_open: false,
            carafe_removed: false,
            json_logs: false,
            log_file: None,
            metrics_addr: None,
            journal_path: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--tick-ms" => {
                    if i + 1 < args.len() {
                        cfg.tick_ms = args[i + 1].parse().unwrap_or(500).max(1);
                        i += 1;
                    }
                }
                "--water" => {
                    if i + 1 < args.len() {
                        cfg.initial_water = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--coffee" => {
                    if i + 1 < args.len() {
                        cfg.initial_coffee = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--boiler-on" => {
                    cfg.boiler_on = true;
                }
                "--valve-open" => {
                    cfg.valve_open = true;
                }
                "--no-carafe" => {
                    cfg.carafe_removed = true;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-file" => {
                    if i + 1 < args.len() {
                        cfg.log_file = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--journal" => {
                    if i + 1 < args.len() {
                        cfg.journal_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn print_help() {
        println!(
            r#"brew-sim - Coffee maker hardware simulator

USAGE:
    brew-sim [OPTIONS]

OPTIONS:
    --tick-ms <MS>          Microcontroller tick period [default: 500]
    --run-seconds <SECS>    Run for a fixed duration then exit
    --water <N>             Initial water level (0-100)
    --coffee <N>            Initial coffee level (0-100)
    --boiler-on             Switch the boiler element on at startup
    --valve-open            Open the pressure valve at startup
    --no-carafe             Start with the carafe removed from the plate
    --json-logs             Output logs in JSON format (for log aggregation)
    --log-file <PATH>       Also write logs to a file (non-blocking)
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 127.0.0.1:9090)
    --journal <PATH>        Record every state change to a JSONL file
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,brew_core=trace)

EXAMPLES:
    # Brew ten units, then stop
    brew-sim --water 10 --boiler-on --run-seconds 6

    # Fast run with a journal
    brew-sim --water 50 --boiler-on --tick-ms 10 --run-seconds 2 --journal brew.jsonl
"#
        );
    }
}
