//! 와이어 코덱
//!
//! - 롱 헤더: connection_id(4) + packet_number(4) + flow_id(4) + payload
//! - 숏 헤더: packet_number(4) + flow_id(4) + payload
//!
//! 모든 정수 필드는 big-endian u32. 길이 프리픽스, 체크섬, 매직 넘버,
//! 버전 필드는 없다. 롱 헤더는 연결 수립에 단 한 번만 쓰이고 이후의
//! 데이터/ACK 트래픽은 전부 숏 헤더다.

use bytes::Bytes;
use rand::Rng;

use crate::{Error, Result, MAX_GENERATED_ID};

/// 롱 헤더 고정 길이 (바이트)
pub const LONG_HEADER_LEN: usize = 12;

/// 숏 헤더 고정 길이 (바이트)
pub const SHORT_HEADER_LEN: usize = 8;

/// ACK 페이로드 마커
pub const ACK_PAYLOAD: &[u8] = b"ACK";

/// 롱 헤더 패킷 (연결 수립용, 클라이언트가 1회 전송)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongHeader {
    /// 연결 ID (클라이언트가 할당, 서버는 그대로 보관)
    pub connection_id: u32,

    /// 패킷 번호
    pub packet_number: u32,

    /// 플로우 ID (수립 패킷은 관례상 0)
    pub flow_id: u32,

    /// 페이로드 (임의 인사말, 비어 있어도 됨)
    pub payload: Bytes,
}

impl LongHeader {
    /// 바이트로 직렬화
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(LONG_HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.connection_id.to_be_bytes());
        buf.extend_from_slice(&self.packet_number.to_be_bytes());
        buf.extend_from_slice(&self.flow_id.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// 바이트에서 역직렬화
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LONG_HEADER_LEN {
            return Err(Error::MalformedPacket {
                required: LONG_HEADER_LEN,
                got: bytes.len(),
            });
        }

        let connection_id = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let packet_number = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let flow_id = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let payload = Bytes::copy_from_slice(&bytes[LONG_HEADER_LEN..]);

        Ok(Self {
            connection_id,
            packet_number,
            flow_id,
            payload,
        })
    }
}

/// 숏 헤더 패킷 (수립 이후 양방향 전 트래픽)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortHeader {
    /// 패킷 번호
    pub packet_number: u32,

    /// 플로우 ID
    pub flow_id: u32,

    /// 페이로드 (데이터 청크 또는 ACK 마커)
    pub payload: Bytes,
}

impl ShortHeader {
    /// 데이터 패킷 생성
    pub fn new(packet_number: u32, flow_id: u32, payload: Bytes) -> Self {
        Self {
            packet_number,
            flow_id,
            payload,
        }
    }

    /// 수신한 (패킷 번호, 플로우 ID)를 그대로 되돌리는 ACK 패킷 생성
    pub fn ack(packet_number: u32, flow_id: u32) -> Self {
        Self {
            packet_number,
            flow_id,
            payload: Bytes::from_static(ACK_PAYLOAD),
        }
    }

    /// ACK 패킷 여부
    pub fn is_ack(&self) -> bool {
        self.payload.as_ref() == ACK_PAYLOAD
    }

    /// 바이트로 직렬화
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SHORT_HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.packet_number.to_be_bytes());
        buf.extend_from_slice(&self.flow_id.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// 바이트에서 역직렬화
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SHORT_HEADER_LEN {
            return Err(Error::MalformedPacket {
                required: SHORT_HEADER_LEN,
                got: bytes.len(),
            });
        }

        let packet_number = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let flow_id = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let payload = Bytes::copy_from_slice(&bytes[SHORT_HEADER_LEN..]);

        Ok(Self {
            packet_number,
            flow_id,
            payload,
        })
    }
}

/// 연결 ID 생성: [1, 1_000_000] 균등 분포
///
/// 충돌 검사는 하지 않는다. 동시 연결 두 개가 이론상 같은 값을 뽑을 수
/// 있지만 이 프로토콜은 단일 클라이언트 전제라 그대로 둔다.
pub fn generate_connection_id() -> u32 {
    rand::thread_rng().gen_range(1..=MAX_GENERATED_ID)
}

/// 초기 패킷 번호 생성: [1, 1_000_000] 균등 분포
pub fn generate_packet_number() -> u32 {
    rand::thread_rng().gen_range(1..=MAX_GENERATED_ID)
}

/// 전송용 랜덤 페이로드 생성: 정확히 size 바이트
pub fn generate_random_file(size: usize) -> Bytes {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill(&mut data[..]);
    Bytes::from(data)
}
