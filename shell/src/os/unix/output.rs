use crate::editor::command::Command;
use std::{
    io,
    os::unix::io::{AsRawFd, RawFd},
    pin::Pin,
    task::{Context, Poll},
};
use termios::Termios;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub struct TerminalOutput<O: AsRawFd> {
    stdout: O,
    normal_termios: Termios,
    raw_termios: Termios,
    is_raw: bool,
}

impl<O: AsRawFd> TerminalOutput<O> {
    pub fn new(stdout: O) -> io::Result<Self> {
        let normal_termios = Termios::from_fd(stdout.as_raw_fd())?;
        let mut raw_termios = normal_termios;
        termios::cfmakeraw(&mut raw_termios);

        Ok(Self {
            stdout,
            normal_termios,
            raw_termios,
            is_raw: false,
        })
    }

    pub fn set_raw_mode(&mut self, raw: bool) -> io::Result<()> {
        if raw != self.is_raw {
            let termios = if raw {
                &self.raw_termios
            } else {
                &self.normal_termios
            };

            termios::tcsetattr(self.stdout.as_raw_fd(), termios::TCSANOW, termios)?;
            self.is_raw = raw;
        }

        Ok(())
    }
}

impl<O: AsyncWrite + AsRawFd + Unpin> TerminalOutput<O> {
    pub async fn command(&mut self, command: Command) -> io::Result<()> {
        self.write_all(command.sequence().as_bytes()).await
    }
}

impl<O: AsyncWrite + AsRawFd + Unpin> AsyncWrite for TerminalOutput<O> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        Pin::new(&mut self.stdout).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Pin::new(&mut self.stdout).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Pin::new(&mut self.stdout).poll_shutdown(cx)
    }
}

impl<O: AsRawFd> AsRawFd for TerminalOutput<O> {
    fn as_raw_fd(&self) -> RawFd {
        self.stdout.as_raw_fd()
    }
}

impl<O: AsRawFd> Drop for TerminalOutput<O> {
    fn drop(&mut self) {
        if self.is_raw {
            let _ = termios::tcsetattr(self.stdout.as_raw_fd(), termios::TCSANOW, &self.normal_termios);
        }
    }
}
