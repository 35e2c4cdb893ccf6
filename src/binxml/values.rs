use crate::binxml::cursor::ByteCursor;
use crate::binxml::decoder::{BinXmlDecoder, StreamCtx, XmlState, MAX_BINXML_NESTING};
use crate::err::DeserializationResult;
use crate::guid::Guid;
use crate::kv_output::KvEmitter;
use crate::ntsid::Sid;
use crate::template_registry::TemplateArgPair;
use crate::utils::format_filetime;

use log::{trace, warn};

impl<'a> BinXmlDecoder<'a> {
    /// Decode one bound argument according to the type carried by the
    /// instance's argument map (not the type the template body declared) and
    /// emit it under the placeholder's key.
    ///
    /// The length also comes from the argument map; fixed-width types read
    /// their own width, everything else is sized by `arg_len`.
    pub(crate) fn render_argument(
        &mut self,
        ctx: &mut StreamCtx<'a>,
        pair: &TemplateArgPair,
        arg_type: u16,
        arg_len: u16,
        emitter: &mut KvEmitter<'_>,
    ) -> DeserializationResult<()> {
        let key = pair.key.as_str();
        let len = usize::from(arg_len);

        match arg_type {
            // String: UTF-16LE, no terminator
            0x01 => {
                let value = ctx.cursor.utf16_string_by_size(len, "argument.string")?;
                emitter.literal(key, &value);
            }
            // UInt8
            0x04 => {
                let value = ctx.cursor.u8("argument.u8")?;
                emitter.token(format_args!("'{}':{:02}, ", key, value));
            }
            // UInt16
            0x06 => {
                let value = ctx.cursor.u16("argument.u16")?;
                let description = if key == "EventID" {
                    self.tables.event_description(value)
                } else {
                    None
                };
                match description {
                    Some(description) => {
                        emitter.token(format_args!("'{}':{:04} ({}), ", key, value, description));
                    }
                    None => emitter.token(format_args!("'{}':{:04}, ", key, value)),
                }
            }
            // UInt32
            0x08 => {
                let value = ctx.cursor.u32("argument.u32")?;
                let label = if key == "LogonType" {
                    self.tables.logon_type(value)
                } else {
                    None
                };
                match label {
                    Some(label) => {
                        emitter.token(format_args!("'{}':{:08} ({}), ", key, value, label));
                    }
                    None => emitter.token(format_args!("'{}':{:08}, ", key, value)),
                }
            }
            // UInt64
            0x0a => {
                let value = ctx.cursor.u64("argument.u64")?;
                emitter.token(format_args!("'{}':{:016}, ", key, value));
            }
            // Binary: hex dump of exactly `arg_len` bytes
            0x0e => {
                let bytes = ctx.cursor.take_bytes(len, "argument.binary")?;
                emitter.token(format_args!("'{}':", key));
                for byte in bytes {
                    emitter.token(format_args!("{:02X}", byte));
                }
                emitter.token(format_args!(", "));
            }
            // GUID: 16 bytes on the wire; a longer declared length is
            // consumed so the following arguments stay aligned
            0x0f => {
                let guid = Guid::from_cursor(&mut ctx.cursor)?;
                emitter.token(format_args!("'{}':{}, ", key, guid));
                ctx.cursor.skip(len.saturating_sub(16));
            }
            // FILETIME; values with no calendar form fall back to raw hex
            0x11 => {
                let filetime = ctx.cursor.u64("argument.filetime")?;
                match format_filetime(filetime) {
                    Some(timestamp) => emitter.token(format_args!("'{}':{}, ", key, timestamp)),
                    None => emitter.token(format_args!("'{}':{:016X}, ", key, filetime)),
                }
            }
            // SID: header plus as many sub-authorities as `arg_len` covers
            0x13 => {
                let sid = Sid::from_cursor_sized(&mut ctx.cursor, len)?;
                emitter.token(format_args!("'{}':{}, ", key, sid));
                ctx.cursor.skip(len - Sid::consumed_size(len));
            }
            // HexInt32 / HexInt64
            0x14 => {
                let value = ctx.cursor.u32("argument.hex32")?;
                emitter.token(format_args!("'{}':{:08X}, ", key, value));
            }
            0x15 => {
                let value = ctx.cursor.u64("argument.hex64")?;
                emitter.token(format_args!("'{}':{:016X}, ", key, value));
            }
            // Nested binxml: best-effort decode of exactly `arg_len` bytes.
            // Failures are swallowed; dirty samples contain truncated nested
            // documents and the rest of the record is still recoverable.
            0x21 => {
                self.render_nested_binxml(ctx, arg_len, emitter);
            }
            // Void: consumed silently
            0x00 => ctx.cursor.skip(len),
            unknown => {
                trace!("unhandled argument type {:04x}, emitting placeholder", unknown);
                emitter.token(format_args!(
                    "'{}':'...//{:04X}[{:04X}]', ",
                    key, pair.declared_type, arg_len
                ));
                ctx.cursor.skip(len);
            }
        }

        Ok(())
    }

    fn render_nested_binxml(
        &mut self,
        ctx: &mut StreamCtx<'a>,
        arg_len: u16,
        emitter: &mut KvEmitter<'_>,
    ) {
        let len = usize::from(arg_len);
        let base = ctx.cursor.chunk_position() as usize;
        let available = len.min(ctx.cursor.remaining());
        let nested = ctx
            .cursor
            .peek_bytes(available, "argument.binxml")
            .unwrap_or(&[]);

        if self.depth >= MAX_BINXML_NESTING {
            warn!("nested binxml argument exceeds nesting limit, skipping");
        } else {
            let mut nested_ctx = StreamCtx {
                cursor: ByteCursor::new(nested, base),
                state: XmlState::Normal,
                cached_value: ctx.cached_value.clone(),
                current_template: ctx.current_template,
            };

            self.depth += 1;
            if let Err(e) = self.parse_stream(&mut nested_ctx, emitter) {
                trace!("ignoring error in nested binxml argument: {}", e);
            }
            self.depth -= 1;
        }

        // The outer cursor advances past the declared length no matter what
        // the nested parse did.
        ctx.cursor.skip(len);
    }
}
