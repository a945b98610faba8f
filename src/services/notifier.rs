/// User-visible progress and error messages
///
/// Notifications are short, transient messages for the person running the
/// sync. They are separate from the log, which keeps the details.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Prints notifications to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        log::info!("notice: {}", message);
        println!("{}", message);
    }
}

/// Keeps notifications in memory for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
