use abx_experiment::{ResponseRow, Sink, SinkError};
use std::time::Duration;

/// Posts each row as a JSON object to a collection endpoint
pub struct HttpSink {
    url: String,
    agent: ureq::Agent,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();
        Self {
            url: url.into(),
            agent,
        }
    }
}

impl Sink for HttpSink {
    fn append(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        match self.agent.post(&self.url).send_json(row) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => {
                Err(SinkError::Rejected(format!("{} returned HTTP {}", self.url, code)))
            }
            Err(e) => Err(SinkError::Unavailable(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
