use spincanvas_scene::TimeSource;

/// Seconds from `performance.now()`
#[derive(Debug, Clone)]
pub struct PerformanceTime {
    performance: Option<web_sys::Performance>,
}

impl PerformanceTime {
    pub fn new(window: &web_sys::Window) -> Self {
        Self {
            performance: window.performance(),
        }
    }
}

impl TimeSource for PerformanceTime {
    fn now_secs(&self) -> f64 {
        match &self.performance {
            Some(performance) => performance.now() / 1000.0,
            None => js_sys::Date::now() / 1000.0,
        }
    }
}
