use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use task_runtime::shim::dispatch;
use task_runtime::{logging, registry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();
    logging::load_dotenv();

    let task_name: Arc<str> = std::env::var("TASK_HANDLER")
        .map_err(|_| Error::from("TASK_HANDLER must be configured"))?
        .into();
    let tasks = Arc::new(registry());
    if tasks.get(&task_name).is_none() {
        return Err(Error::from(format!("unknown task '{task_name}'")));
    }

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let tasks = Arc::clone(&tasks);
        let task_name = Arc::clone(&task_name);
        async move {
            info!(task = %task_name, request_id = %event.context.request_id, "invoking task");
            dispatch(tasks, task_name, event.payload).await
        }
    }))
    .await
}
