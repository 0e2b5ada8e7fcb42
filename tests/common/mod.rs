//! Local servers for integration tests: a small SOCKS4/4a/5 relay that logs
//! every handshake, a plain HTTP target, and a TLS target with a throwaway
//! self-signed certificate.

#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::hash::MessageDigest;
use boring::pkey::PKey;
use boring::rsa::Rsa;
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::extension::SubjectAlternativeName;
use boring::x509::{X509NameBuilder, X509};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What a client asked one SOCKS server for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub version: u8,
    pub target: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

pub struct SocksServer {
    pub addr: SocketAddr,
    pub log: Arc<Mutex<Vec<Handshake>>>,
}

impl SocksServer {
    pub fn handshakes(&self) -> Vec<Handshake> {
        self.log.lock().unwrap().clone()
    }

    pub fn url(&self, scheme: &str) -> String {
        format!("{}://{}", scheme, self.addr)
    }
}

/// Start a SOCKS server. With `auth` set, SOCKS5 clients must authenticate
/// with exactly that username and password.
pub async fn spawn_socks(auth: Option<(&str, &str)>) -> SocksServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Arc<Mutex<Vec<Handshake>>> = Arc::default();
    let auth = auth.map(|(u, p)| (u.to_string(), p.to_string()));

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = server_log.clone();
            let auth = auth.clone();
            tokio::spawn(async move {
                let _ = serve_socks(stream, auth, log).await;
            });
        }
    });

    SocksServer { addr, log }
}

/// A port with nothing listening on it.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn read_until_nul(stream: &mut TcpStream) -> io::Result<String> {
    let mut out = Vec::new();
    loop {
        let b = stream.read_u8().await?;
        if b == 0 {
            break;
        }
        out.push(b);
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

async fn serve_socks(
    mut stream: TcpStream,
    auth: Option<(String, String)>,
    log: Arc<Mutex<Vec<Handshake>>>,
) -> io::Result<()> {
    match stream.read_u8().await? {
        4 => serve_socks4(stream, log).await,
        5 => serve_socks5(stream, auth, log).await,
        _ => Ok(()),
    }
}

async fn serve_socks4(mut stream: TcpStream, log: Arc<Mutex<Vec<Handshake>>>) -> io::Result<()> {
    let _command = stream.read_u8().await?;
    let port = stream.read_u16().await?;
    let mut ip = [0u8; 4];
    stream.read_exact(&mut ip).await?;
    let user = read_until_nul(&mut stream).await?;

    // 0.0.0.x with x != 0 marks a SOCKS4a hostname after the user id.
    let host = if ip[..3] == [0, 0, 0] && ip[3] != 0 {
        read_until_nul(&mut stream).await?
    } else {
        Ipv4Addr::from(ip).to_string()
    };
    let target = format!("{}:{}", host, port);

    log.lock().unwrap().push(Handshake {
        version: 4,
        target: target.clone(),
        user: Some(user).filter(|u| !u.is_empty()),
        password: None,
    });

    match TcpStream::connect((host.as_str(), port)).await {
        Ok(mut upstream) => {
            stream.write_all(&[0, 0x5A, 0, 0, 0, 0, 0, 0]).await?;
            tokio::io::copy_bidirectional(&mut stream, &mut upstream).await?;
        }
        Err(_) => {
            stream.write_all(&[0, 0x5B, 0, 0, 0, 0, 0, 0]).await?;
        }
    }
    Ok(())
}

async fn serve_socks5(
    mut stream: TcpStream,
    auth: Option<(String, String)>,
    log: Arc<Mutex<Vec<Handshake>>>,
) -> io::Result<()> {
    let method_count = stream.read_u8().await?;
    let mut methods = vec![0u8; method_count as usize];
    stream.read_exact(&mut methods).await?;

    let mut credentials = (None, None);
    match &auth {
        Some((expected_user, expected_pass)) => {
            if !methods.contains(&2) {
                stream.write_all(&[5, 0xFF]).await?;
                return Ok(());
            }
            stream.write_all(&[5, 2]).await?;

            let _sub_version = stream.read_u8().await?;
            let user_len = stream.read_u8().await?;
            let mut user = vec![0u8; user_len as usize];
            stream.read_exact(&mut user).await?;
            let pass_len = stream.read_u8().await?;
            let mut pass = vec![0u8; pass_len as usize];
            stream.read_exact(&mut pass).await?;
            let user = String::from_utf8_lossy(&user).into_owned();
            let pass = String::from_utf8_lossy(&pass).into_owned();

            if &user != expected_user || &pass != expected_pass {
                stream.write_all(&[1, 1]).await?;
                return Ok(());
            }
            stream.write_all(&[1, 0]).await?;
            credentials = (Some(user), Some(pass));
        }
        None => {
            stream.write_all(&[5, 0]).await?;
        }
    }

    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    let host = match head[3] {
        1 => {
            let mut ip = [0u8; 4];
            stream.read_exact(&mut ip).await?;
            Ipv4Addr::from(ip).to_string()
        }
        3 => {
            let len = stream.read_u8().await?;
            let mut name = vec![0u8; len as usize];
            stream.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
        4 => {
            let mut ip = [0u8; 16];
            stream.read_exact(&mut ip).await?;
            Ipv6Addr::from(ip).to_string()
        }
        _ => return Ok(()),
    };
    let port = stream.read_u16().await?;

    log.lock().unwrap().push(Handshake {
        version: 5,
        target: format!("{}:{}", host, port),
        user: credentials.0,
        password: credentials.1,
    });

    match TcpStream::connect((host.as_str(), port)).await {
        Ok(mut upstream) => {
            stream.write_all(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
            tokio::io::copy_bidirectional(&mut stream, &mut upstream).await?;
        }
        Err(_) => {
            // 0x05: connection refused
            stream.write_all(&[5, 5, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
        }
    }
    Ok(())
}

/// Read a request head and answer with a fixed body.
async fn serve_http<S>(mut stream: S, heads: Arc<Mutex<Vec<String>>>, body: &'static str) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    heads.lock().unwrap().push(String::from_utf8_lossy(&buf).into_owned());

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

pub struct HttpTarget {
    pub addr: SocketAddr,
    pub heads: Arc<Mutex<Vec<String>>>,
    /// PEM of the served certificate; empty for plain HTTP.
    pub cert_pem: Vec<u8>,
}

/// Plain HTTP server answering every request with `body`.
pub async fn spawn_http(body: &'static str) -> HttpTarget {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads: Arc<Mutex<Vec<String>>> = Arc::default();

    let server_heads = heads.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let heads = server_heads.clone();
            tokio::spawn(async move {
                let _ = serve_http(stream, heads, body).await;
            });
        }
    });

    HttpTarget {
        addr,
        heads,
        cert_pem: Vec::new(),
    }
}

fn self_signed_acceptor() -> (SslAcceptor, Vec<u8>) {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut cert = X509::builder().unwrap();
    cert.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    cert.set_serial_number(&serial).unwrap();
    cert.set_subject_name(&name).unwrap();
    cert.set_issuer_name(&name).unwrap();
    cert.set_pubkey(&pkey).unwrap();
    let not_before = Asn1Time::days_from_now(0).unwrap();
    cert.set_not_before(&not_before).unwrap();
    let not_after = Asn1Time::days_from_now(7).unwrap();
    cert.set_not_after(&not_after).unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .build(&cert.x509v3_context(None, None))
        .unwrap();
    cert.append_extension(san).unwrap();
    cert.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = cert.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pkey).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    (acceptor.build(), cert.to_pem().unwrap())
}

/// HTTPS server presenting a self-signed certificate for `localhost`.
pub async fn spawn_https(body: &'static str) -> HttpTarget {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads: Arc<Mutex<Vec<String>>> = Arc::default();
    let (acceptor, cert_pem) = self_signed_acceptor();
    let acceptor = Arc::new(acceptor);

    let server_heads = heads.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let heads = server_heads.clone();
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(tls) = tokio_boring::accept(&acceptor, stream).await {
                    let _ = serve_http(tls, heads, body).await;
                }
            });
        }
    });

    HttpTarget {
        addr,
        heads,
        cert_pem,
    }
}
