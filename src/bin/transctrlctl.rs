//! `transctrlctl` — a minimal CLI over the Unix-socket gRPC endpoint, for
//! manual operation and smoke-testing. Not covered by the core's test suite.

use tonic::transport::{Endpoint, Uri};
use tower::service_fn;
use transctrl::service::proto::{transmission_controller_client::TransmissionControllerClient, Empty, InstanceId};

async fn connect(
    socket_path: String,
) -> Result<TransmissionControllerClient<tonic::transport::Channel>, Box<dyn std::error::Error>> {
    let channel = Endpoint::try_from("http://[::]:50051")?
        .connect_with_connector(service_fn(move |_: Uri| {
            let path = socket_path.clone();
            async move {
                Ok::<_, std::io::Error>(hyper_util::rt::TokioIo::new(
                    tokio::net::UnixStream::connect(path).await?,
                ))
            }
        }))
        .await?;
    Ok(TransmissionControllerClient::new(channel))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket_path =
        std::env::var("SOCKET_PATH").unwrap_or_else(|_| "/var/run/transctrl/transctrl.sock".to_string());
    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "status".to_string());

    let mut client = connect(socket_path).await?;

    match command.as_str() {
        "status" => {
            let response = client.get_status(Empty {}).await?.into_inner();
            for instance in response.instances {
                println!(
                    "{}  container={}  status={}  web_port={}  data_port={}",
                    instance.id,
                    instance.container_id,
                    instance.status,
                    instance.actual_web_port,
                    instance.actual_data_port
                );
            }
        }
        "get" => {
            let id = args.next().ok_or("usage: transctrlctl get <id>")?;
            let response = client
                .get_instance(InstanceId { id })
                .await?
                .into_inner();
            println!("{response:?}");
        }
        other => {
            eprintln!("unknown command: {other} (expected: status | get <id>)");
            std::process::exit(1);
        }
    }

    Ok(())
}
