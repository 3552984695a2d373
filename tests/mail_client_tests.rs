use referral_automation::core::service_client::ATTACHMENT_FIELD;
use referral_automation::core::{MailServiceClient, OutboundMessage, SendEndpoint};
use referral_automation::error::DispatchError;
use referral_automation::utils::build_attachment;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one HTTP request, answer with `status`, and hand back the raw request text.
async fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = find(&request, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while request.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).to_string()
    });

    (base_url, handle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn message() -> OutboundMessage {
    OutboundMessage {
        to: "john.smith@gmail.com".to_string(),
        subject: "Regarding referral opportunity at Tech Corp".to_string(),
        body: "Hi John,\nI hope you're doing well!".to_string(),
        attachment: build_attachment("Resume.pdf", b"%PDF-1.7 resume bytes".to_vec()).unwrap(),
    }
}

#[tokio::test]
async fn test_send_posts_multipart_fields() {
    let (base_url, server) = one_shot_server("200 OK", "sent").await;
    let client = MailServiceClient::new(&base_url, "/api/send-referral-mail", 5).unwrap();

    client.send(&message()).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/send-referral-mail HTTP/1.1"));
    assert!(request.contains("multipart/form-data; boundary="));
    assert!(request.contains("name=\"to\"\r\n\r\njohn.smith@gmail.com"));
    assert!(request.contains("name=\"subject\"\r\n\r\nRegarding referral opportunity at Tech Corp"));
    assert!(request.contains("Hi John,\nI hope you're doing well!"));
    assert!(request.contains(&format!(
        "name=\"{}\"; filename=\"Resume.pdf\"",
        ATTACHMENT_FIELD
    )));
    assert!(request.contains("Content-Type: application/pdf"));
    assert!(request.contains("%PDF-1.7 resume bytes"));
}

#[tokio::test]
async fn test_error_status_is_rejected() {
    let (base_url, server) = one_shot_server("500 Internal Server Error", "smtp down").await;
    let client = MailServiceClient::new(&base_url, "/api/send-referral-mail", 5).unwrap();

    let result = client.send(&message()).await;
    server.await.unwrap();

    assert_eq!(
        result,
        Err(DispatchError::Rejected {
            status: 500,
            message: "smtp down".to_string(),
        })
    );
}
