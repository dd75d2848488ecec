use js_sys::Array;
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_KEYS: &'static str = r#"
export type ZoneKey = "head" | "thorax" | "abdomen" | "pelvis" | "shoulder" | "humerus" | "forearm" | "hand" | "femur" | "knee" | "tibia" | "ankle" | "foot" | "miss";
export type ControlKey = "cart_x" | "cart_z" | "lift" | "orbital" | "wig_wag" | "column_rotation";
export type NodeName = "cart" | "column" | "lift" | "shoulder" | "wig_wag" | "c_slide" | "source" | "detector";
"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(s: &str);
    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn(s: &str);
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(s: &str);
}

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{} {}] {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => console_error(&line),
            Level::Warn => console_warn(&line),
            _ => console_log(&line),
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger and the panic hook. `level` is one of `off`, `error`,
/// `warn`, `info`, `debug` or `trace`; anything else means `info`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    console_error_panic_hook::set_once();
    // A second call only changes the level.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level.parse().unwrap_or(LevelFilter::Info));
}

pub fn parse_js_point<const D: usize>(val: &JsValue) -> Option<[f64; D]> {
    let arr = val.dyn_ref::<Array>()?;
    if arr.length() < D as u32 {
        return None;
    }
    let mut point = [0.0; D];
    for i in 0..D {
        point[i] = arr.get(i as u32).as_f64()?;
    }
    Some(point)
}
