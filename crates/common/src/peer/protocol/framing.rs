use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{ProtocolError, MAX_MESSAGE_SIZE};

/// Write `payload` prefixed with its length as a big-endian u32.
pub async fn write_frame<W>(send: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(payload.len()));
    }
    send.write_u32(payload.len() as u32).await?;
    send.write_all(payload).await?;
    send.flush().await?;
    Ok(())
}

/// Read one length-prefixed message.
pub async fn read_frame<R>(recv: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = recv.read_u32().await? as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }
    let mut buf = vec![0u8; len];
    recv.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_layout() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc").await.unwrap();
        assert_eq!(out, vec![0, 0, 0, 3, b'a', b'b', b'c']);

        let mut input = out.as_slice();
        assert_eq!(read_frame(&mut input).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut out = Vec::new();
        write_frame(&mut out, b"").await.unwrap();
        let mut input = out.as_slice();
        assert!(read_frame(&mut input).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_length_is_rejected() {
        let header = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes();
        let mut input = &header[..];
        assert!(matches!(
            read_frame(&mut input).await,
            Err(ProtocolError::MessageTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let raw = [0u8, 0, 0, 10, 1, 2, 3];
        let mut input = &raw[..];
        assert!(matches!(
            read_frame(&mut input).await,
            Err(ProtocolError::Io(_))
        ));
    }
}
