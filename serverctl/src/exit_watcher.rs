use tokio::{
    process::Child,
    sync::{mpsc, oneshot, watch},
};
use tracing::{info, warn};

use crate::events::{ServerOutput, WriterEvent, EXIT_CODE_UNKNOWN};

pub(crate) struct IoDone {
    pub reader: oneshot::Receiver<()>,
    pub writer: oneshot::Receiver<()>,
}

pub(crate) fn spawn_exit_watcher(
    mut child: Child,
    alive: watch::Sender<bool>,
    watcher_to_writer: mpsc::UnboundedSender<WriterEvent>,
    io_done: IoDone,
    watcher_to_main: mpsc::Sender<ServerOutput>,
) {
    tokio::spawn(async move {
        let code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(EXIT_CODE_UNKNOWN),
            Err(e) => {
                warn!("error while waiting for server process: {e}");
                EXIT_CODE_UNKNOWN
            }
        };

        alive.send_replace(false);
        let _ = watcher_to_writer.send(WriterEvent::Terminate);

        // Both pipes are released before anyone hears about the exit
        let _ = io_done.reader.await;
        let _ = io_done.writer.await;

        info!(code, "server process exited");
        let _ = watcher_to_main.send(ServerOutput::Exit { code }).await;
    });
}
