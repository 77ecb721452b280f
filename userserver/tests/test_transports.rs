use std::collections::HashSet;
use std::sync::Arc;
use userserver::http::soap_router;
use userserver::{Server, UdpServer};
use usersoap::client::{ClientError, HttpSoapClient, SoapReply, UdpSoapClient};
use usersoap::operations::{
    CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse,
    GetUserByIdRequest, GetUserByIdResponse,
};
use usersoap::{Dispatcher, FaultCode, OperationRegistry, encode_envelope};
use userstore::{Repository, User, UserStore};

struct TestService {
    http: Server,
    udp: UdpServer,
    endpoint: String,
    udp_addr: std::net::SocketAddr,
}

impl TestService {
    async fn stop(mut self) {
        self.udp.stop().await;
        self.http.stop().await;
    }
}

async fn start_service(max_datagram_size: usize) -> TestService {
    let store = UserStore::open_in_memory().unwrap();
    let mut alice = User::new("Alice Johnson", "alice@example.com");
    store.save(&mut alice).unwrap();

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(OperationRegistry::with_user_operations()),
        Arc::new(store),
    ));

    let mut udp = UdpServer::new("127.0.0.1", 0, dispatcher.clone())
        .with_max_datagram_size(max_datagram_size);
    let udp_addr = udp.start().await.unwrap();

    let mut http = Server::new("test", "127.0.0.1", 0);
    http.add_router("/", soap_router("/soap/user", dispatcher)).await;
    let http_addr = http.start().await.unwrap();

    TestService {
        http,
        udp,
        endpoint: format!("http://{}/soap/user", http_addr),
        udp_addr,
    }
}

#[tokio::test]
async fn test_udp_get_seeded_user() {
    let service = start_service(4096).await;
    let client = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let reply = client.call(&GetUserByIdRequest::new(1)).await.unwrap();
    let response: GetUserByIdResponse = reply.decode().unwrap();
    assert_eq!(response.user.name, "Alice Johnson");
    assert_eq!(response.user.email, "alice@example.com");

    service.stop().await;
}

#[tokio::test]
async fn test_transports_return_identical_envelopes() {
    let service = start_service(4096).await;
    let udp = UdpSoapClient::connect(service.udp_addr).await.unwrap();
    let http = HttpSoapClient::new(service.endpoint.clone()).unwrap();

    for request in [
        encode_envelope(&GetUserByIdRequest::new(1)).unwrap(),
        encode_envelope(&GetUserByIdRequest::new(77)).unwrap(),
        encode_envelope(&DeleteUserRequest::new(55)).unwrap(),
        "<Envelope><Body><InvalidOperation/></Body></Envelope>".to_string(),
        "<Envelope><Body></Body></Envelope>".to_string(),
    ] {
        let over_udp = udp.send_raw(request.as_bytes()).await.unwrap();
        let (status, over_http) = http.send_raw(request.clone()).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(over_udp, over_http, "transports disagree for {request}");
    }

    service.stop().await;
}

#[tokio::test]
async fn test_create_over_http_then_get_over_udp() {
    let service = start_service(4096).await;
    let http = HttpSoapClient::new(service.endpoint.clone()).unwrap();
    let udp = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let created: CreateUserResponse = http
        .call(&CreateUserRequest::new("Bob Smith", "bob@example.com"))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert!(created.user.id > 1);

    let fetched: GetUserByIdResponse = udp
        .call(&GetUserByIdRequest::new(created.user.id))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(fetched.user, created.user);

    let deleted: DeleteUserResponse = udp
        .call(&DeleteUserRequest::new(created.user.id))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert!(deleted.success);

    service.stop().await;
}

#[tokio::test]
async fn test_unknown_operation_over_udp() {
    let service = start_service(4096).await;
    let client = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let raw = client
        .send_raw(b"<Envelope><Body><InvalidOperation/></Body></Envelope>")
        .await
        .unwrap();
    let reply = SoapReply::parse(raw).unwrap();
    let fault = reply.fault().unwrap();
    assert_eq!(fault.code(), Some(FaultCode::MustUnderstand));
    assert_eq!(fault.fault_string, "Unknown operation: InvalidOperation");

    service.stop().await;
}

#[tokio::test]
async fn test_concurrent_udp_creates_get_distinct_ids() {
    let service = start_service(4096).await;
    let addr = service.udp_addr;

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            tokio::spawn(async move {
                let client = UdpSoapClient::connect(addr).await.unwrap();
                let response: CreateUserResponse = client
                    .call(&CreateUserRequest::new(
                        format!("user{i}"),
                        format!("user{i}@example.com"),
                    ))
                    .await
                    .unwrap()
                    .decode()
                    .unwrap();
                response.user.id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap()));
    }
    assert_eq!(ids.len(), 20);

    service.stop().await;
}

#[tokio::test]
async fn test_oversized_datagram_is_rejected() {
    let service = start_service(512).await;
    let client = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let padding = "x".repeat(1024);
    let request = encode_envelope(&CreateUserRequest::new(padding, "big@example.com")).unwrap();
    assert!(request.len() > 512);

    let err = client
        .call(&CreateUserRequest::new("x".repeat(1024), "big@example.com"))
        .await
        .unwrap()
        .decode::<CreateUserResponse>()
        .unwrap_err();

    match err {
        ClientError::Fault(fault) => {
            assert_eq!(fault.code(), Some(FaultCode::Client));
            assert_eq!(
                fault.fault_string,
                "Message exceeds maximum datagram size of 512 bytes"
            );
        }
        other => panic!("expected a fault, got {other:?}"),
    }

    service.stop().await;
}

/// Requête GetUserByID de 1 complétée par un élément ignoré jusqu'à `len` octets
fn padded_get_request(len: usize) -> String {
    let head = "<Envelope><Body><GetUserByID><id>1</id><padding>";
    let tail = "</padding></GetUserByID></Body></Envelope>";
    let request = format!("{head}{}{tail}", "x".repeat(len - head.len() - tail.len()));
    assert_eq!(request.len(), len);
    request
}

#[tokio::test]
async fn test_datagram_at_limit_is_dispatched() {
    let service = start_service(512).await;
    let client = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let raw = client
        .send_raw(padded_get_request(512).as_bytes())
        .await
        .unwrap();
    let response: GetUserByIdResponse = SoapReply::parse(raw).unwrap().decode().unwrap();
    assert_eq!(response.user.name, "Alice Johnson");

    let raw = client
        .send_raw(padded_get_request(513).as_bytes())
        .await
        .unwrap();
    let fault = SoapReply::parse(raw).unwrap().fault().unwrap();
    assert_eq!(fault.code(), Some(FaultCode::Client));
    assert_eq!(
        fault.fault_string,
        "Message exceeds maximum datagram size of 512 bytes"
    );

    service.stop().await;
}

#[tokio::test]
async fn test_oversized_reply_becomes_server_fault() {
    let name = "n".repeat(200);
    let email = "long@example.com";
    let request = encode_envelope(&CreateUserRequest::new(name.clone(), email)).unwrap();
    let reply = encode_envelope(&CreateUserResponse::new(User {
        id: 2,
        name,
        email: email.to_string(),
    }))
    .unwrap();
    assert!(reply.len() > request.len());

    let limit = request.len();
    let service = start_service(limit).await;
    let client = UdpSoapClient::connect(service.udp_addr).await.unwrap();

    let raw = client.send_raw(request.as_bytes()).await.unwrap();
    let fault = SoapReply::parse(raw).unwrap().fault().unwrap();
    assert_eq!(fault.code(), Some(FaultCode::Server));
    assert_eq!(
        fault.fault_string,
        format!("Response exceeds maximum datagram size of {limit} bytes")
    );

    // L'écriture a eu lieu malgré la réponse perdue
    let deleted: DeleteUserResponse = client
        .call(&DeleteUserRequest::new(2))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert!(deleted.success);

    service.stop().await;
}

#[tokio::test]
async fn test_udp_timeout_after_stop() {
    let mut service = start_service(4096).await;
    service.udp.stop().await;

    let client = UdpSoapClient::connect(service.udp_addr)
        .await
        .unwrap()
        .with_timeout(std::time::Duration::from_millis(200));
    let result = client.call(&GetUserByIdRequest::new(1)).await;
    assert!(matches!(
        result,
        Err(ClientError::Timeout(_)) | Err(ClientError::Io(_))
    ));

    service.http.stop().await;
}
